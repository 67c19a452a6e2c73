//! Connection authorization.
//!
//! `connect` runs a fixed precondition chain against the collaborators and
//! stops at the first failure. Nothing is mutated until every check has
//! passed; then a Connect action is scheduled and a reservation is recorded
//! in the same call, so a second request sees the slot as taken.
//!
//! Order of checks:
//!
//! 1. target format
//! 2. canonical host id
//! 3. no active session or pending connection
//! 4. host exists
//! 5. host online
//! 6. host discovered
//! 7. firewall bypass owned when required
//! 8. VPN up when the current mission is VPN-gated
//! 9. usable credentials (cracked when the host demands it)
//! 10. explicit username matches
//! 11. password present
//! 12. filesystem configured

use crate::collab::Capabilities;
use crate::connection::PendingConnection;
use crate::content::{CredentialSource, FIREWALL_BYPASS};
use crate::error::ConnectError;
use crate::events::GameEvent;
use crate::hosts::{canonicalize, parse_target};
use crate::mission::VPN_CONNECT_COMMAND;
use crate::scheduler::{ActionHandle, ActionRequest, Scheduler};
use crate::types::{ActionKind, DifficultyLevel};

pub const CONNECT_BASE_TICKS: u64 = 3;

/// A request that passed every precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub host_id: String,
    pub username: String,
}

/// Immediate answer to a successful `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPending {
    pub host_id: String,
    pub username: String,
    pub handle: ActionHandle,
    pub duration_ticks: u64,
}

pub struct Authorizer<'a, W> {
    world: &'a mut W,
    scheduler: &'a mut Scheduler<W>,
    difficulty: DifficultyLevel,
    base_ticks: u64,
}

impl<'a, W: Capabilities + 'static> Authorizer<'a, W> {
    pub fn new(
        world: &'a mut W,
        scheduler: &'a mut Scheduler<W>,
        difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            world,
            scheduler,
            difficulty,
            base_ticks: CONNECT_BASE_TICKS,
        }
    }

    pub fn with_base_ticks(mut self, base_ticks: u64) -> Self {
        self.base_ticks = base_ticks;
        self
    }

    pub fn duration_ticks(&self) -> u64 {
        self.difficulty.scale(self.base_ticks)
    }

    /// Run the precondition chain without touching any state.
    pub fn authorize(&self, raw_target: &str) -> Result<Authorized, ConnectError> {
        let world = &*self.world;

        let target = parse_target(raw_target)?;
        let host_id = canonicalize(&target.host_ref);

        let conn = world.connection();
        if let Some(current) = conn.current_remote_host() {
            if current == host_id {
                return Err(ConnectError::AlreadyConnectedSame(host_id));
            }
            return Err(ConnectError::AlreadyConnectedOther {
                current: current.to_string(),
                requested: host_id,
            });
        }
        if let Some(pending) = conn.pending_connection() {
            return Err(ConnectError::ConnectionInProgress(pending.host_id.clone()));
        }

        let host = world
            .hosts()
            .get_host(&host_id)
            .ok_or_else(|| ConnectError::HostNotFound(host_id.clone()))?;

        if !host.is_online {
            return Err(ConnectError::HostOffline(host_id));
        }

        if !world.discovery().is_host_discovered(&host_id) {
            return Err(ConnectError::HostNotDiscovered(host_id));
        }

        if host.security.requires_firewall_bypass
            && !world.inventory().owns_capability(FIREWALL_BYPASS)
        {
            return Err(ConnectError::FirewallBlocked(host_id));
        }

        if self.mission_needs_vpn() && !conn.is_vpn_connected() {
            return Err(ConnectError::VpnRequired(host_id));
        }

        let credential = conn
            .get_credentials(&host_id)
            .ok_or_else(|| ConnectError::MissingCredentials(host_id.clone()))?;
        if host.requires_cracking() && credential.source != CredentialSource::Cracked {
            return Err(ConnectError::MissingCredentials(host_id));
        }

        if let Some(given) = &target.username {
            if *given != credential.username {
                return Err(ConnectError::InvalidUsername {
                    host: host_id,
                    given: given.clone(),
                });
            }
        }

        if credential.password.as_deref().map_or(true, str::is_empty) {
            return Err(ConnectError::MissingPassword(host_id));
        }

        if world.filesystems().resolve_file_system(&host_id).is_none() {
            return Err(ConnectError::ServerNotConfigured(host_id));
        }

        Ok(Authorized {
            username: credential.username.clone(),
            host_id,
        })
    }

    /// Authorize, schedule the Connect action, and reserve the slot.
    pub fn connect(mut self, raw_target: &str) -> Result<ConnectPending, ConnectError> {
        let authorized = match self.authorize(raw_target) {
            Ok(a) => a,
            Err(e) => {
                tracing::debug!(input = raw_target, error = %e.tag(), "connect rejected");
                return Err(e);
            }
        };

        let duration_ticks = self.duration_ticks();
        let Authorized { host_id, username } = authorized;

        let cb_host = host_id.clone();
        let cb_user = username.clone();
        let request = ActionRequest::new(
            ActionKind::Connect,
            format!("connect {host_id}"),
            duration_ticks,
            move |world: &mut W| {
                world.connection_mut().release_reservation();
                world.filesystems_mut().activate(&cb_host, &cb_user)?;
                world.connection_mut().set_connected(&cb_host, &cb_user);
                world.events().emit(GameEvent::Connected {
                    host_id: cb_host,
                    username: cb_user,
                });
                Ok(())
            },
        );
        let handle = self.scheduler.enqueue(request);

        self.world.connection_mut().reserve(PendingConnection {
            host_id: host_id.clone(),
            username: username.clone(),
            handle,
        });

        tracing::info!(host = %host_id, user = %username, ticks = duration_ticks, "connecting");

        Ok(ConnectPending {
            host_id,
            username,
            handle,
            duration_ticks,
        })
    }

    /// True when the current mission still has an open task whose solution
    /// is a VPN connect.
    fn mission_needs_vpn(&self) -> bool {
        let missions = self.world.missions();
        let Some(mission) = missions.current_mission() else {
            return false;
        };
        mission.tasks.iter().any(|task| {
            !missions.is_task_completed(&mission.id, &task.id)
                && task.solution.trim_start().starts_with(VPN_CONNECT_COMMAND)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{ConnectionStore, Discovery, MissionTracker};
    use crate::content::{CredentialRecord, WorldContent};
    use crate::error::ErrorTag;
    use crate::filesystem::FileSystems;
    use crate::scheduler::ActionOutcome;
    use crate::world::World;

    fn world() -> World {
        World::new(WorldContent::builtin().unwrap())
    }

    fn discovered(hosts: &[&str]) -> World {
        let mut w = world();
        for h in hosts {
            w.mark_discovered(h);
        }
        w
    }

    fn try_connect(
        w: &mut World,
        s: &mut Scheduler<World>,
        target: &str,
    ) -> Result<ConnectPending, ConnectError> {
        Authorizer::new(w, s, DifficultyLevel::Normal).connect(target)
    }

    fn tag_of(w: &mut World, target: &str) -> ErrorTag {
        let mut s = Scheduler::new();
        try_connect(w, &mut s, target).unwrap_err().tag()
    }

    #[test]
    fn successful_connect_completes_after_duration() {
        let mut w = discovered(&["megacorp-server-01"]);
        let mut s = Scheduler::new();
        let mut rx = w.events.subscribe();

        let pending = try_connect(&mut w, &mut s, "server-01").unwrap();
        assert_eq!(pending.host_id, "megacorp-server-01");
        assert_eq!(pending.duration_ticks, 3);
        assert!(w.current_remote_host().is_none());
        assert!(w.pending_connection().is_some());

        s.advance(&mut w, 2);
        assert!(w.current_remote_host().is_none());

        s.advance(&mut w, 1);
        assert_eq!(w.current_remote_host(), Some("megacorp-server-01"));
        assert_eq!(w.connection.session_username(), Some("admin"));
        assert!(w.pending_connection().is_none());
        assert_eq!(w.filesystems.active().unwrap().cwd, "/home/admin");

        let events = crate::events::drain(&mut rx);
        assert_eq!(
            events,
            vec![GameEvent::Connected {
                host_id: "megacorp-server-01".into(),
                username: "admin".into()
            }]
        );
    }

    #[test]
    fn invalid_format_comes_first() {
        let mut w = world();
        assert_eq!(tag_of(&mut w, "root@"), ErrorTag::InvalidFormat);
    }

    #[test]
    fn unknown_host() {
        let mut w = world();
        assert_eq!(tag_of(&mut w, "nowhere"), ErrorTag::HostNotFound);
    }

    #[test]
    fn odd_bare_name_is_an_unknown_host() {
        let mut w = world();
        assert_eq!(tag_of(&mut w, "box!"), ErrorTag::HostNotFound);
        assert_eq!(tag_of(&mut w, "admin@box!"), ErrorTag::HostNotFound);
    }

    #[test]
    fn failed_mount_leaves_no_session() {
        let mut w = discovered(&["megacorp-server-01"]);
        let mut s = Scheduler::new();
        let mut rx = w.events.subscribe();
        try_connect(&mut w, &mut s, "server-01").unwrap();

        // Filesystem vanishes while the connect is in flight.
        w.filesystems = FileSystems::new(Vec::new());
        let fired = s.run_until_idle(&mut w);

        assert_eq!(fired.len(), 1);
        assert!(matches!(fired[0].outcome, ActionOutcome::Failed(_)));
        assert!(w.current_remote_host().is_none());
        assert!(w.pending_connection().is_none());
        assert!(w.filesystems.active().is_none());
        assert!(crate::events::drain(&mut rx).is_empty());
    }

    #[test]
    fn offline_beats_undiscovered() {
        let mut w = world();
        assert!(!w.is_host_discovered("old-mainframe"));
        assert_eq!(tag_of(&mut w, "old-mainframe"), ErrorTag::HostOffline);
    }

    #[test]
    fn undiscovered_host_is_rejected() {
        let mut w = world();
        assert_eq!(tag_of(&mut w, "megacorp-server-01"), ErrorTag::HostNotDiscovered);
    }

    #[test]
    fn firewall_needs_bypass_tool() {
        let mut w = discovered(&["shadow-relay"]);
        assert_eq!(tag_of(&mut w, "relay"), ErrorTag::FirewallBlocked);

        w.inventory.grant(FIREWALL_BYPASS);
        let mut s = Scheduler::new();
        assert!(try_connect(&mut w, &mut s, "relay").is_ok());
    }

    #[test]
    fn vpn_gated_mission_requires_vpn() {
        let mut w = discovered(&["megacorp-intranet"]);
        w.missions.record_command("scan");
        w.missions.record_connection("megacorp-server-01");
        assert_eq!(w.current_mission().unwrap().id, "inside-job");
        assert_eq!(tag_of(&mut w, "intranet"), ErrorTag::VpnRequired);

        w.connection.set_vpn_connected(true);
        let mut s = Scheduler::new();
        assert!(try_connect(&mut w, &mut s, "intranet").is_ok());
    }

    #[test]
    fn bundled_credentials_do_not_satisfy_cracking() {
        let mut w = discovered(&["megacorp-db-01"]);
        assert!(w.get_credentials("megacorp-db-01").is_some());
        assert_eq!(tag_of(&mut w, "db-01"), ErrorTag::MissingCredentials);

        w.store_credentials(CredentialRecord {
            host_id: "megacorp-db-01".into(),
            username: "dbadmin".into(),
            password: Some("Tr0ub4dor&3".into()),
            source: CredentialSource::Cracked,
        });
        let mut s = Scheduler::new();
        assert!(try_connect(&mut w, &mut s, "db-01").is_ok());
    }

    #[test]
    fn no_credentials_at_all() {
        let mut w = discovered(&["blackbox-vault"]);
        assert_eq!(tag_of(&mut w, "blackbox-vault"), ErrorTag::MissingCredentials);
    }

    #[test]
    fn explicit_username_must_match() {
        let mut w = discovered(&["megacorp-server-01"]);
        assert_eq!(tag_of(&mut w, "root@server-01"), ErrorTag::InvalidUsername);
        let mut s = Scheduler::new();
        assert!(try_connect(&mut w, &mut s, "admin@server-01").is_ok());
    }

    #[test]
    fn missing_password() {
        let mut w = discovered(&["legacy-printer"]);
        assert_eq!(tag_of(&mut w, "legacy-printer"), ErrorTag::MissingPassword);
    }

    #[test]
    fn server_without_filesystem() {
        let mut w = discovered(&["honeypot-07"]);
        assert_eq!(tag_of(&mut w, "honeypot-07"), ErrorTag::ServerNotConfigured);
    }

    #[test]
    fn second_connect_to_other_host_leaves_state_unchanged() {
        let mut w = discovered(&["megacorp-server-01", "megacorp-intranet"]);
        let mut s = Scheduler::new();
        try_connect(&mut w, &mut s, "server-01").unwrap();
        s.run_until_idle(&mut w);

        let err = try_connect(&mut w, &mut s, "megacorp-intranet").unwrap_err();
        assert!(matches!(err, ConnectError::AlreadyConnectedOther { .. }));
        assert!(err.to_string().contains("disconnect first"));
        assert_eq!(w.current_remote_host(), Some("megacorp-server-01"));
        assert_eq!(w.connection.session_username(), Some("admin"));
        assert!(s.is_idle());
    }

    #[test]
    fn reconnect_to_same_host_is_already_connected() {
        let mut w = discovered(&["megacorp-server-01"]);
        let mut s = Scheduler::new();
        try_connect(&mut w, &mut s, "megacorp-server-01").unwrap();
        s.run_until_idle(&mut w);
        let err = try_connect(&mut w, &mut s, "server-01").unwrap_err();
        assert_eq!(err, ConnectError::AlreadyConnectedSame("megacorp-server-01".into()));
    }

    #[test]
    fn reservation_blocks_concurrent_connects() {
        let mut w = discovered(&["megacorp-server-01", "megacorp-intranet"]);
        let mut s = Scheduler::new();
        try_connect(&mut w, &mut s, "server-01").unwrap();

        let err = try_connect(&mut w, &mut s, "megacorp-intranet").unwrap_err();
        assert!(matches!(err, ConnectError::ConnectionInProgress(_)));
        assert_eq!(err.tag(), ErrorTag::AlreadyConnected);
        assert_eq!(s.pending_count(), 1);

        s.run_until_idle(&mut w);
        assert_eq!(w.current_remote_host(), Some("megacorp-server-01"));
    }

    #[test]
    fn duration_scales_with_difficulty() {
        let mut w = discovered(&["megacorp-server-01"]);
        let mut s = Scheduler::new();
        let pending = Authorizer::new(&mut w, &mut s, DifficultyLevel::Hard)
            .connect("server-01")
            .unwrap();
        assert_eq!(pending.duration_ticks, 5);
        assert_eq!(s.remaining(pending.handle), Some(5));
    }
}
