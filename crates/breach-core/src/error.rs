use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BreachError {
    #[error("not initialized: run 'breach init'")]
    NotInitialized,

    #[error("unknown difficulty '{0}': must be easy, normal, hard, or expert")]
    UnknownDifficulty(String),

    #[error("unknown challenge type '{0}': must be math, logic, or pattern")]
    UnknownChallengeType(String),

    #[error("no filesystem configured for host: {0}")]
    FileSystemMissing(String),

    #[error("invalid world content: {0}")]
    InvalidWorld(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BreachError>;

// ---------------------------------------------------------------------------
// Connect rejections
// ---------------------------------------------------------------------------

/// Serializable tag attached to a failed `CommandResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTag {
    InvalidFormat,
    AlreadyConnected,
    HostNotFound,
    HostOffline,
    HostNotDiscovered,
    FirewallBlocked,
    VpnRequired,
    MissingCredentials,
    InvalidUsername,
    MissingPassword,
    ServerNotConfigured,
}

impl ErrorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTag::InvalidFormat => "invalid_format",
            ErrorTag::AlreadyConnected => "already_connected",
            ErrorTag::HostNotFound => "host_not_found",
            ErrorTag::HostOffline => "host_offline",
            ErrorTag::HostNotDiscovered => "host_not_discovered",
            ErrorTag::FirewallBlocked => "firewall_blocked",
            ErrorTag::VpnRequired => "vpn_required",
            ErrorTag::MissingCredentials => "missing_credentials",
            ErrorTag::InvalidUsername => "invalid_username",
            ErrorTag::MissingPassword => "missing_password",
            ErrorTag::ServerNotConfigured => "server_not_configured",
        }
    }

    /// Fixed hint telling the player which world change unblocks the command.
    pub fn remediation(self) -> &'static str {
        match self {
            ErrorTag::InvalidFormat => "Usage: connect <host> or connect <user>@<host>",
            ErrorTag::AlreadyConnected => "Run 'disconnect' first to close the current session",
            ErrorTag::HostNotFound => "Check the host name; run 'hosts' to list known hosts",
            ErrorTag::HostOffline => "The host is down; try again later or pick another target",
            ErrorTag::HostNotDiscovered => "Run 'scan' to discover hosts first",
            ErrorTag::FirewallBlocked => "Install a firewall bypass tool before connecting",
            ErrorTag::VpnRequired => "Run 'vpn connect' before reaching this network",
            ErrorTag::MissingCredentials => "Crack the host's credentials first with 'crack <host>'",
            ErrorTag::InvalidUsername => "Use the username from the recovered credentials",
            ErrorTag::MissingPassword => "The recovered credentials have no password; crack them again",
            ErrorTag::ServerNotConfigured => "This server has no reachable filesystem yet",
        }
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a `connect` request was rejected. The first failing precondition wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("invalid target '{0}': expected <host> or <user>@<host>")]
    InvalidFormat(String),

    #[error("already connected to {0}")]
    AlreadyConnectedSame(String),

    #[error("already connected to {current}; disconnect first before connecting to {requested}")]
    AlreadyConnectedOther { current: String, requested: String },

    #[error("connection to {0} already in progress")]
    ConnectionInProgress(String),

    #[error("host not found: {0}")]
    HostNotFound(String),

    #[error("host {0} is offline")]
    HostOffline(String),

    #[error("host {0} has not been discovered")]
    HostNotDiscovered(String),

    #[error("connection to {0} blocked by firewall")]
    FirewallBlocked(String),

    #[error("host {0} is only reachable over the VPN")]
    VpnRequired(String),

    #[error("no usable credentials for {0}")]
    MissingCredentials(String),

    #[error("user '{given}' is not valid on {host}")]
    InvalidUsername { host: String, given: String },

    #[error("credentials for {0} have no password")]
    MissingPassword(String),

    #[error("server {0} is not configured")]
    ServerNotConfigured(String),
}

impl ConnectError {
    pub fn tag(&self) -> ErrorTag {
        match self {
            ConnectError::InvalidFormat(_) => ErrorTag::InvalidFormat,
            ConnectError::AlreadyConnectedSame(_)
            | ConnectError::AlreadyConnectedOther { .. }
            | ConnectError::ConnectionInProgress(_) => ErrorTag::AlreadyConnected,
            ConnectError::HostNotFound(_) => ErrorTag::HostNotFound,
            ConnectError::HostOffline(_) => ErrorTag::HostOffline,
            ConnectError::HostNotDiscovered(_) => ErrorTag::HostNotDiscovered,
            ConnectError::FirewallBlocked(_) => ErrorTag::FirewallBlocked,
            ConnectError::VpnRequired(_) => ErrorTag::VpnRequired,
            ConnectError::MissingCredentials(_) => ErrorTag::MissingCredentials,
            ConnectError::InvalidUsername { .. } => ErrorTag::InvalidUsername,
            ConnectError::MissingPassword(_) => ErrorTag::MissingPassword,
            ConnectError::ServerNotConfigured(_) => ErrorTag::ServerNotConfigured,
        }
    }
}
