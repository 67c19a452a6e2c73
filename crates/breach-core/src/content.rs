//! Static world content: hosts, bundled credentials, filesystems, missions,
//! and the tool catalog. Ships embedded; `.breach/world.yaml` replaces it.

use crate::error::{BreachError, Result};
use crate::filesystem::RemoteFileSystem;
use crate::mission::Mission;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_WORLD: &str = include_str!("../data/world.yaml");

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSecurity {
    #[serde(default)]
    pub requires_firewall_bypass: bool,
}

/// What it takes to log into a host, and the secret a crack reveals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredentials {
    #[serde(default)]
    pub requires_cracking: bool,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_online")]
    pub is_online: bool,
    #[serde(default)]
    pub security: HostSecurity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<HostCredentials>,
    /// Hidden hosts never show up in a scan.
    #[serde(default)]
    pub hidden: bool,
}

fn default_online() -> bool {
    true
}

impl HostRecord {
    pub fn requires_cracking(&self) -> bool {
        self.credentials
            .as_ref()
            .map(|c| c.requires_cracking)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Shipped with the world (leaked config files, default passwords).
    Bundled,
    /// Produced by the cracking subsystem.
    Cracked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub host_id: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub source: CredentialSource,
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Capability id checked by the authorizer, e.g. `firewall-bypass`.
    pub id: String,
    #[serde(default)]
    pub description: String,
}

pub const FIREWALL_BYPASS: &str = "firewall-bypass";
pub const PASSWORD_CRACKER: &str = "password-cracker";

// ---------------------------------------------------------------------------
// WorldContent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldContent {
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
    #[serde(default)]
    pub bundled_credentials: Vec<CredentialRecord>,
    #[serde(default)]
    pub filesystems: Vec<RemoteFileSystem>,
    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub starting_inventory: Vec<String>,
}

impl WorldContent {
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_WORLD)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let content: WorldContent = serde_yaml::from_str(data)?;
        content.check()?;
        Ok(content)
    }

    /// Use `.breach/world.yaml` when present, otherwise the embedded world.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::world_override_path(root);
        if path.exists() {
            tracing::info!(path = %path.display(), "loading world override");
            let data = std::fs::read_to_string(&path)?;
            return Self::parse(&data);
        }
        Self::builtin()
    }

    pub fn host(&self, id: &str) -> Option<&HostRecord> {
        self.hosts.iter().find(|h| h.id == id)
    }

    fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !seen.insert(host.id.as_str()) {
                return Err(BreachError::InvalidWorld(format!(
                    "duplicate host id '{}'",
                    host.id
                )));
            }
        }
        for fs in &self.filesystems {
            if !seen.contains(fs.host_id.as_str()) {
                return Err(BreachError::InvalidWorld(format!(
                    "filesystem for unknown host '{}'",
                    fs.host_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_world_parses() {
        let world = WorldContent::builtin().unwrap();
        assert!(world.host("megacorp-server-01").is_some());
        assert!(world.host("megacorp-db-01").unwrap().requires_cracking());
        assert!(world.tools.iter().any(|t| t.id == FIREWALL_BYPASS));
    }

    #[test]
    fn builtin_hosts_are_canonical() {
        let world = WorldContent::builtin().unwrap();
        for host in &world.hosts {
            assert_eq!(crate::hosts::canonicalize(&host.id), host.id);
        }
    }

    #[test]
    fn duplicate_hosts_rejected() {
        let yaml = "hosts:\n  - id: a\n  - id: a\n";
        assert!(matches!(
            WorldContent::parse(yaml),
            Err(BreachError::InvalidWorld(_))
        ));
    }

    #[test]
    fn host_defaults_to_online() {
        let world = WorldContent::parse("hosts:\n  - id: box\n").unwrap();
        let host = world.host("box").unwrap();
        assert!(host.is_online);
        assert!(!host.security.requires_firewall_bypass);
        assert!(host.credentials.is_none());
    }
}
