//! Remote session state and the credential vault.
//!
//! At most one remote host is active at a time. A connect request that has
//! passed authorization holds a `PendingConnection` reservation until its
//! scheduled action fires or is cancelled; while either a session or a
//! reservation exists, further connect requests are refused.

use crate::content::{CredentialRecord, CredentialSource};
use crate::scheduler::ActionHandle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConnection {
    pub host_id: String,
    pub username: String,
    pub handle: ActionHandle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub host_id: String,
    pub username: String,
}

// ---------------------------------------------------------------------------
// CredentialVault
// ---------------------------------------------------------------------------

/// One record per `(host, source)`; a newer record replaces an older one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialVault {
    records: Vec<CredentialRecord>,
}

impl CredentialVault {
    pub fn new(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let mut vault = Self::default();
        for r in records {
            vault.store(r);
        }
        vault
    }

    pub fn store(&mut self, record: CredentialRecord) {
        self.records
            .retain(|r| !(r.host_id == record.host_id && r.source == record.source));
        self.records.push(record);
    }

    /// Best record for a host: cracked beats bundled.
    pub fn lookup(&self, host_id: &str) -> Option<&CredentialRecord> {
        let mut bundled = None;
        for r in self.records.iter().filter(|r| r.host_id == host_id) {
            match r.source {
                CredentialSource::Cracked => return Some(r),
                CredentialSource::Bundled => bundled = Some(r),
            }
        }
        bundled
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    session: Option<RemoteSession>,
    pending: Option<PendingConnection>,
    vpn_connected: bool,
    vault: CredentialVault,
}

impl ConnectionState {
    pub fn new(vault: CredentialVault) -> Self {
        Self {
            vault,
            ..Self::default()
        }
    }

    pub fn current_remote_host(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.host_id.as_str())
    }

    pub fn session_username(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.username.as_str())
    }

    pub fn session(&self) -> Option<&RemoteSession> {
        self.session.as_ref()
    }

    pub fn credentials(&self, host_id: &str) -> Option<&CredentialRecord> {
        self.vault.lookup(host_id)
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut CredentialVault {
        &mut self.vault
    }

    pub fn is_vpn_connected(&self) -> bool {
        self.vpn_connected
    }

    pub fn set_vpn_connected(&mut self, connected: bool) {
        self.vpn_connected = connected;
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn reserve(&mut self, pending: PendingConnection) {
        self.pending = Some(pending);
    }

    pub fn release_reservation(&mut self) -> Option<PendingConnection> {
        self.pending.take()
    }

    pub fn set_connected(&mut self, host_id: &str, username: &str) {
        self.session = Some(RemoteSession {
            host_id: host_id.to_string(),
            username: username.to_string(),
        });
    }

    /// Drop the session and any reservation. Returns the previous session.
    pub fn clear(&mut self) -> Option<RemoteSession> {
        self.pending = None;
        self.session.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: &str, user: &str, source: CredentialSource) -> CredentialRecord {
        CredentialRecord {
            host_id: host.into(),
            username: user.into(),
            password: Some("pw".into()),
            source,
        }
    }

    #[test]
    fn cracked_beats_bundled() {
        let vault = CredentialVault::new([
            record("db", "old", CredentialSource::Bundled),
            record("db", "new", CredentialSource::Cracked),
        ]);
        assert_eq!(vault.lookup("db").unwrap().username, "new");
    }

    #[test]
    fn store_replaces_same_source() {
        let mut vault = CredentialVault::default();
        vault.store(record("db", "a", CredentialSource::Cracked));
        vault.store(record("db", "b", CredentialSource::Cracked));
        assert_eq!(vault.records().len(), 1);
        assert_eq!(vault.lookup("db").unwrap().username, "b");
    }

    #[test]
    fn clear_drops_session_and_reservation() {
        let mut state = ConnectionState::default();
        state.set_connected("box", "alice");
        assert_eq!(state.current_remote_host(), Some("box"));
        assert_eq!(state.session_username(), Some("alice"));
        let prev = state.clear().unwrap();
        assert_eq!(prev.host_id, "box");
        assert!(state.current_remote_host().is_none());
        assert!(state.pending().is_none());
    }
}
