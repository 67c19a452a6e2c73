//! Host reference parsing and canonicalization.
//!
//! Every host reference typed by the player passes through `canonicalize`
//! before it touches the authorizer or the connection store, so renamed
//! hosts keep answering to their legacy names.

use crate::error::ConnectError;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Legacy aliases
// ---------------------------------------------------------------------------

/// `(legacy, canonical)`. No canonical id may appear on the left-hand side,
/// which is what keeps `canonicalize` idempotent.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("server-01", "megacorp-server-01"),
    ("db-01", "megacorp-db-01"),
    ("intranet", "megacorp-intranet"),
    ("relay", "shadow-relay"),
];

pub fn canonicalize(host_ref: &str) -> String {
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == host_ref)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| host_ref.to_string())
}

// ---------------------------------------------------------------------------
// Target parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub host_ref: String,
}

/// Parse `user@host` or bare `host`.
///
/// Only the shape is checked here: no empty segment, one `@` at most, no
/// whitespace. Whether the host exists is the authorizer's question.
pub fn parse_target(input: &str) -> Result<Target, ConnectError> {
    let input = input.trim();
    let invalid = || ConnectError::InvalidFormat(input.to_string());

    let (username, host_ref) = match input.split_once('@') {
        Some((user, host)) => {
            if user.is_empty() || host.is_empty() || host.contains('@') {
                return Err(invalid());
            }
            (Some(user), host)
        }
        None => (None, input),
    };

    if input.is_empty() || input.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(Target {
        username: username.map(str::to_string),
        host_ref: host_ref.to_string(),
    })
}
