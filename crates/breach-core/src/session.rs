//! Command dispatcher.
//!
//! A `Session` owns the world, the scheduler that drives it, and the
//! escalation state. `execute` answers every command immediately; work that
//! takes time (connect, scan, crack) is enqueued and its outcome shows up
//! later as a `GameEvent` when the owner calls `advance`.

use crate::authorizer::Authorizer;
use crate::challenge::{ChallengeRegistry, ChallengeType};
use crate::collab::{ConnectionStore, Discovery, HostRegistry, Inventory, MissionTracker};
use crate::config::GameConfig;
use crate::content::{CredentialRecord, CredentialSource, WorldContent, PASSWORD_CRACKER};
use crate::error::{ConnectError, ErrorTag};
use crate::escalation::{EscalationState, SolveOutcome};
use crate::events::{self, GameEvent};
use crate::hosts::canonicalize;
use crate::save::SaveGame;
use crate::scheduler::{ActionOutcome, ActionRequest, FiredAction, Scheduler};
use crate::types::{ActionKind, DifficultyLevel};
use crate::world::World;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// CommandResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub output: Vec<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational_content: Option<String>,
}

impl CommandResult {
    pub fn ok(output: Vec<String>) -> Self {
        Self {
            output,
            success: true,
            error: None,
            educational_content: None,
        }
    }

    pub fn fail(output: Vec<String>) -> Self {
        Self {
            output,
            success: false,
            error: None,
            educational_content: None,
        }
    }

    fn line(ok: bool, line: impl Into<String>) -> Self {
        let output = vec![line.into()];
        if ok {
            Self::ok(output)
        } else {
            Self::fail(output)
        }
    }

    fn tagged(message: impl Into<String>, tag: ErrorTag) -> Self {
        Self {
            output: vec![message.into(), tag.remediation().to_string()],
            success: false,
            error: Some(tag),
            educational_content: None,
        }
    }

    fn rejected(err: &ConnectError) -> Self {
        Self::tagged(err.to_string(), err.tag())
    }
}

const HELP: &[(&str, &str)] = &[
    ("connect [user@]<host>", "open a remote session"),
    ("disconnect", "close the remote session or abort a pending connect"),
    ("cancel", "abort a connection attempt in progress"),
    ("scan", "discover hosts on the network"),
    ("crack <host>", "recover credentials for a discovered host"),
    ("vpn [connect|disconnect]", "toggle the VPN tunnel"),
    ("install <tool>", "install a tool from the catalog"),
    ("challenge [math|logic|pattern]", "request an escalation challenge"),
    ("solve <answer>", "answer the current challenge"),
    ("sudo <password>", "escalate to root with a one-time password"),
    ("exit", "leave the root shell, or disconnect"),
    ("status", "show session status"),
    ("hosts", "list discovered hosts"),
    ("difficulty [level]", "show or change difficulty"),
    ("help", "show this help"),
];

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    world: World,
    scheduler: Scheduler<World>,
    config: GameConfig,
    difficulty: DifficultyLevel,
    escalation: EscalationState,
    registry: ChallengeRegistry,
    rng: StdRng,
    events: broadcast::Receiver<GameEvent>,
}

impl Session {
    pub fn new(world: World, config: GameConfig, difficulty: DifficultyLevel) -> Self {
        let events = world.events.subscribe();
        Self {
            world,
            scheduler: Scheduler::new(),
            config,
            difficulty,
            escalation: EscalationState::default(),
            registry: ChallengeRegistry::with_builtin(),
            rng: StdRng::from_entropy(),
            events,
        }
    }

    pub fn from_save(content: WorldContent, save: &SaveGame, config: GameConfig) -> Self {
        let mut session = Self::new(World::hydrate(content, save), config, save.difficulty);
        session.escalation = save.escalation.clone();
        session
    }

    pub fn with_registry(mut self, registry: ChallengeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler<World> {
        &self.scheduler
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    pub fn escalation(&self) -> &EscalationState {
        &self.escalation
    }

    pub fn to_save(&self) -> SaveGame {
        SaveGame::dehydrate(&self.world, self.difficulty, &self.escalation)
    }

    fn scaled(&self, kind: ActionKind) -> u64 {
        self.difficulty.scale(self.config.durations.base_for(kind))
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Move the clock forward and return every event raised meanwhile.
    pub fn advance(&mut self, ticks: u64) -> Vec<GameEvent> {
        let fired = self.scheduler.advance(&mut self.world, ticks);
        self.settle(fired);
        self.drain_events()
    }

    /// Fire everything still pending, in due order.
    pub fn run_until_idle(&mut self) -> Vec<GameEvent> {
        let fired = self.scheduler.run_until_idle(&mut self.world);
        self.settle(fired);
        self.drain_events()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        events::drain(&mut self.events)
    }

    /// Report failed actions and credit connect tasks once a session is up.
    fn settle(&mut self, fired: Vec<FiredAction>) {
        for action in fired {
            match action.outcome {
                ActionOutcome::Failed(reason) => {
                    self.world.events.emit(GameEvent::ActionFailed {
                        label: action.label,
                        reason,
                    });
                }
                ActionOutcome::Completed if action.kind == ActionKind::Connect => {
                    let Some(host_id) = self.world.current_remote_host().map(str::to_string) else {
                        continue;
                    };
                    if let Some(title) = self.world.missions.record_connection(&host_id) {
                        tracing::info!(task = %title, "mission task complete");
                        self.world.events.emit(GameEvent::TaskCompleted { title });
                    }
                }
                ActionOutcome::Completed => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    pub fn execute(&mut self, line: &str) -> CommandResult {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return CommandResult::ok(Vec::new());
        };
        let args: Vec<&str> = words.collect();
        let first = args.first().copied();

        let mut result = match command {
            "connect" => self.connect(&args.join(" ")),
            "disconnect" => self.disconnect(),
            "cancel" => self.cancel_connect(),
            "scan" => self.scan(),
            "crack" => self.crack(first),
            "vpn" => self.vpn(first),
            "install" => self.install(first),
            "challenge" => self.challenge(first),
            "solve" => self.solve(&args.join(" ")),
            "sudo" => self.sudo(first),
            "exit" => self.exit(),
            "status" => self.status(),
            "hosts" => self.hosts(),
            "difficulty" => self.set_difficulty(first),
            "help" => Self::help(),
            other => CommandResult::line(false, format!("{other}: command not found")),
        };

        if result.success {
            if let Some(title) = self.world.missions.record_command(line) {
                tracing::info!(task = %title, "mission task complete");
                result.output.push(format!("Mission task complete: {title}"));
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    pub fn connect(&mut self, target: &str) -> CommandResult {
        let base = self.config.durations.base_for(ActionKind::Connect);
        let outcome = Authorizer::new(&mut self.world, &mut self.scheduler, self.difficulty)
            .with_base_ticks(base)
            .connect(target);
        match outcome {
            Ok(pending) => CommandResult::line(
                true,
                format!(
                    "Connecting to {} as {}... ({} ticks)",
                    pending.host_id, pending.username, pending.duration_ticks
                ),
            ),
            Err(e) => CommandResult::rejected(&e),
        }
    }

    /// Close the session, or abort an attempt still in flight. Leaving the
    /// remote host also drops root.
    pub fn disconnect(&mut self) -> CommandResult {
        if self.world.pending_connection().is_some() {
            return self.cancel_connect();
        }
        let Some(session) = self.world.connection.clear() else {
            return CommandResult::line(false, "Not connected");
        };
        self.world.filesystems.deactivate();
        self.escalation.exit_root();
        tracing::info!(host = %session.host_id, "disconnected");
        self.world.events.emit(GameEvent::Disconnected {
            host_id: session.host_id.clone(),
        });
        CommandResult::line(true, format!("Disconnected from {}", session.host_id))
    }

    pub fn cancel_connect(&mut self) -> CommandResult {
        let Some(pending) = self.world.release_reservation() else {
            return CommandResult::line(false, "No connection in progress");
        };
        self.scheduler.cancel(pending.handle);
        tracing::info!(host = %pending.host_id, "connect cancelled");
        self.world.events.emit(GameEvent::ConnectCancelled {
            host_id: pending.host_id.clone(),
        });
        CommandResult::line(true, format!("Aborted connection to {}", pending.host_id))
    }

    pub fn vpn(&mut self, arg: Option<&str>) -> CommandResult {
        match arg {
            Some("connect") => {
                if self.world.is_vpn_connected() {
                    return CommandResult::line(true, "VPN already connected");
                }
                self.world.connection.set_vpn_connected(true);
                CommandResult::line(true, "VPN tunnel established")
            }
            Some("disconnect") => {
                if !self.world.is_vpn_connected() {
                    return CommandResult::line(false, "VPN is not connected");
                }
                self.world.connection.set_vpn_connected(false);
                CommandResult::line(true, "VPN tunnel closed")
            }
            None => {
                let state = if self.world.is_vpn_connected() {
                    "connected"
                } else {
                    "disconnected"
                };
                CommandResult::line(true, format!("VPN: {state}"))
            }
            Some(other) => {
                CommandResult::line(false, format!("vpn: unknown subcommand '{other}'"))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timed tools
    // -----------------------------------------------------------------------

    pub fn scan(&mut self) -> CommandResult {
        let ticks = self.scaled(ActionKind::Scan);
        self.scheduler.enqueue(ActionRequest::new(
            ActionKind::Scan,
            "scan",
            ticks,
            |world: &mut World| {
                let visible: Vec<String> = world
                    .all_hosts()
                    .iter()
                    .filter(|h| h.is_online && !h.hidden)
                    .map(|h| h.id.clone())
                    .collect();
                for host_id in visible {
                    if world.mark_discovered(&host_id) {
                        world.events.emit(GameEvent::HostDiscovered { host_id });
                    }
                }
                Ok(())
            },
        ));
        CommandResult::line(true, format!("Scanning network... ({ticks} ticks)"))
    }

    pub fn crack(&mut self, host_ref: Option<&str>) -> CommandResult {
        let Some(host_ref) = host_ref else {
            return CommandResult::line(false, "Usage: crack <host>");
        };
        let host_id = canonicalize(host_ref);
        let Some(host) = self.world.get_host(&host_id) else {
            return CommandResult::tagged(
                ConnectError::HostNotFound(host_id).to_string(),
                ErrorTag::HostNotFound,
            );
        };
        if !self.world.is_host_discovered(&host_id) {
            return CommandResult::tagged(
                ConnectError::HostNotDiscovered(host_id).to_string(),
                ErrorTag::HostNotDiscovered,
            );
        }
        if !self.world.owns_capability(PASSWORD_CRACKER) {
            return CommandResult::line(
                false,
                format!("crack: {PASSWORD_CRACKER} is not installed (try 'install {PASSWORD_CRACKER}')"),
            );
        }
        let Some(secret) = host.credentials.clone() else {
            return CommandResult::line(false, format!("Nothing to crack on {host_id}"));
        };
        if self
            .world
            .get_credentials(&host_id)
            .is_some_and(|c| c.source == CredentialSource::Cracked)
        {
            return CommandResult::line(true, format!("Credentials for {host_id} already cracked"));
        }

        let ticks = self.scaled(ActionKind::Crack);
        let record = CredentialRecord {
            host_id: host_id.clone(),
            username: secret.username,
            password: secret.password,
            source: CredentialSource::Cracked,
        };
        self.scheduler.enqueue(ActionRequest::new(
            ActionKind::Crack,
            format!("crack {host_id}"),
            ticks,
            move |world: &mut World| {
                let event = GameEvent::CredentialsCracked {
                    host_id: record.host_id.clone(),
                    username: record.username.clone(),
                };
                world.store_credentials(record);
                world.events.emit(event);
                Ok(())
            },
        ));
        CommandResult::line(true, format!("Cracking {host_id}... ({ticks} ticks)"))
    }

    pub fn install(&mut self, tool: Option<&str>) -> CommandResult {
        let Some(tool) = tool else {
            let mut output = vec!["Available tools:".to_string()];
            for t in self.world.inventory.catalog() {
                output.push(format!("  {:<18} {}", t.id, t.description));
            }
            return CommandResult::ok(output);
        };
        if !self.world.inventory.in_catalog(tool) {
            return CommandResult::line(false, format!("install: unknown tool '{tool}'"));
        }
        if self.world.inventory.grant(tool) {
            CommandResult::line(true, format!("Installed {tool}"))
        } else {
            CommandResult::line(true, format!("{tool} is already installed"))
        }
    }

    // -----------------------------------------------------------------------
    // Escalation
    // -----------------------------------------------------------------------

    pub fn challenge(&mut self, kind: Option<&str>) -> CommandResult {
        let kind = match kind.map(str::parse::<ChallengeType>).transpose() {
            Ok(k) => k,
            Err(e) => return CommandResult::line(false, e.to_string()),
        };
        match self
            .escalation
            .generate_new_challenge(&self.registry, kind, &mut self.rng)
        {
            Some(c) => CommandResult::ok(vec![
                format!("[{}] {}", c.kind, c.question),
                "Answer with 'solve <answer>'".to_string(),
            ]),
            None => CommandResult::line(false, "No challenge available"),
        }
    }

    pub fn solve(&mut self, answer: &str) -> CommandResult {
        match self.escalation.solve_challenge(answer, Utc::now()) {
            SolveOutcome::NoChallenge => CommandResult::line(
                false,
                "No active challenge. Run 'challenge' to generate one first",
            ),
            SolveOutcome::Solved { password, attempts } => CommandResult::ok(vec![
                format!("Correct! Solved in {attempts} attempt(s)"),
                format!("Root password: {password}"),
                "Use 'sudo <password>' to escalate".to_string(),
            ]),
            SolveOutcome::Incorrect {
                attempts,
                hint,
                explanation,
            } => {
                let mut result =
                    CommandResult::line(false, format!("Incorrect (attempt {attempts})"));
                if let Some(hint) = hint {
                    result.output.push(format!("Hint: {hint}"));
                }
                result.educational_content = explanation;
                result
            }
        }
    }

    pub fn sudo(&mut self, password: Option<&str>) -> CommandResult {
        if self.world.current_remote_host().is_none() {
            return CommandResult::line(false, "sudo: not connected to a remote host");
        }
        let Some(password) = password else {
            return CommandResult::line(false, "Usage: sudo <password>");
        };
        if self.escalation.become_root(password) {
            tracing::info!("root granted");
            CommandResult::line(true, "Root access granted")
        } else {
            CommandResult::line(false, "sudo: authentication failure")
        }
    }

    pub fn exit(&mut self) -> CommandResult {
        if self.escalation.exit_root() {
            CommandResult::line(true, "Left root shell")
        } else {
            self.disconnect()
        }
    }

    // -----------------------------------------------------------------------
    // Info
    // -----------------------------------------------------------------------

    pub fn status(&self) -> CommandResult {
        let world = &self.world;
        let mut out = vec![format!("Difficulty: {}", self.difficulty)];

        match (world.connection.session(), world.pending_connection()) {
            (Some(s), _) => out.push(format!("Connected: {}@{}", s.username, s.host_id)),
            (None, Some(p)) => out.push(format!(
                "Connecting: {}@{} ({} ticks left)",
                p.username,
                p.host_id,
                self.scheduler.remaining(p.handle).unwrap_or(0)
            )),
            (None, None) => out.push("Connected: no".to_string()),
        }
        out.push(format!(
            "VPN: {}",
            if world.is_vpn_connected() { "up" } else { "down" }
        ));
        out.push(format!("Root: {}", if self.escalation.is_root { "yes" } else { "no" }));
        out.push(format!("Discovered hosts: {}", world.discovery.discovered().len()));
        let tools: Vec<&str> = world.inventory.owned().iter().collect();
        out.push(format!(
            "Tools: {}",
            if tools.is_empty() { "none".to_string() } else { tools.join(", ") }
        ));

        if let Some(mission) = world.current_mission() {
            out.push(format!("Mission: {}", mission.title));
            for task in &mission.tasks {
                let mark = if world.is_task_completed(&mission.id, &task.id) {
                    "x"
                } else {
                    " "
                };
                out.push(format!("  [{mark}] {}", task.title));
            }
        } else {
            out.push("Mission: all missions complete".to_string());
        }

        for action in self.scheduler.pending() {
            out.push(format!("Running: {} (due at tick {})", action.label, action.due_at));
        }
        CommandResult::ok(out)
    }

    pub fn hosts(&self) -> CommandResult {
        let world = &self.world;
        let known: Vec<_> = world
            .all_hosts()
            .iter()
            .filter(|h| world.is_host_discovered(&h.id))
            .collect();
        if known.is_empty() {
            return CommandResult::line(true, "No hosts discovered. Run 'scan'");
        }
        let mut out = Vec::with_capacity(known.len());
        for host in known {
            let status = if host.is_online { "online" } else { "offline" };
            let creds = match world.get_credentials(&host.id) {
                Some(c) if c.source == CredentialSource::Cracked => "cracked",
                Some(_) => "bundled",
                None => "-",
            };
            out.push(format!("{:<22} {:<8} {:<8} {}", host.id, status, creds, host.description));
        }
        CommandResult::ok(out)
    }

    pub fn set_difficulty(&mut self, level: Option<&str>) -> CommandResult {
        let Some(level) = level else {
            return CommandResult::line(true, format!("Difficulty: {}", self.difficulty));
        };
        match level.parse::<DifficultyLevel>() {
            Ok(d) => {
                self.difficulty = d;
                CommandResult::line(true, format!("Difficulty set to {d}"))
            }
            Err(e) => CommandResult::line(false, e.to_string()),
        }
    }

    fn help() -> CommandResult {
        CommandResult::ok(
            HELP.iter()
                .map(|(usage, what)| format!("  {usage:<32} {what}"))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let world = World::new(WorldContent::builtin().unwrap());
        Session::new(world, GameConfig::default(), DifficultyLevel::Normal)
            .with_rng(StdRng::seed_from_u64(7))
    }

    fn scanned() -> Session {
        let mut s = session();
        assert!(s.execute("scan").success);
        s.run_until_idle();
        s
    }

    #[test]
    fn unknown_command_fails() {
        let mut s = session();
        let r = s.execute("hack-the-planet");
        assert!(!r.success);
        assert!(r.output[0].contains("command not found"));
        assert!(s.execute("   ").success);
    }

    #[test]
    fn scan_discovers_visible_online_hosts() {
        let mut s = session();
        let r = s.execute("scan");
        assert!(r.success);
        assert!(r.output.iter().any(|l| l.contains("Mission task complete")));
        assert!(s.advance(1).is_empty());

        let events = s.advance(1);
        assert!(events.contains(&GameEvent::HostDiscovered {
            host_id: "megacorp-server-01".into()
        }));
        assert!(s.world().is_host_discovered("megacorp-db-01"));
        assert!(!s.world().is_host_discovered("old-mainframe"));
        assert!(!s.world().is_host_discovered("blackbox-vault"));

        s.execute("scan");
        assert!(s.run_until_idle().is_empty());
    }

    #[test]
    fn connect_reports_tag_and_remediation() {
        let mut s = session();
        let r = s.execute("connect server-01");
        assert!(!r.success);
        assert_eq!(r.error, Some(ErrorTag::HostNotDiscovered));
        assert!(r.output[1].contains("scan"));
    }

    #[test]
    fn connect_then_disconnect() {
        let mut s = scanned();
        let r = s.execute("connect server-01");
        assert!(r.success, "{:?}", r.output);
        assert!(r.output[0].contains("3 ticks"));

        let events = s.run_until_idle();
        assert_eq!(
            events,
            vec![
                GameEvent::Connected {
                    host_id: "megacorp-server-01".into(),
                    username: "admin".into()
                },
                GameEvent::TaskCompleted {
                    title: "Log into the MegaCorp web server".into()
                },
            ]
        );
        assert!(s.world().missions.is_completed("first-contact", "foothold"));

        assert!(s.execute("disconnect").success);
        assert!(s.world().current_remote_host().is_none());
        assert!(s.world().filesystems.active().is_none());
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::Disconnected {
                host_id: "megacorp-server-01".into()
            }]
        );
        assert!(!s.execute("disconnect").success);
    }

    #[test]
    fn cancel_aborts_pending_connect() {
        let mut s = scanned();
        s.execute("connect server-01");
        let r = s.execute("cancel");
        assert!(r.success);
        assert!(s.scheduler().is_idle());
        assert!(s.world().pending_connection().is_none());

        let events = s.run_until_idle();
        assert_eq!(
            events,
            vec![GameEvent::ConnectCancelled {
                host_id: "megacorp-server-01".into()
            }]
        );
        assert!(s.world().current_remote_host().is_none());
        assert!(!s.execute("cancel").success);
    }

    #[test]
    fn disconnect_while_connecting_aborts() {
        let mut s = scanned();
        s.execute("connect server-01");
        let r = s.execute("disconnect");
        assert!(r.success);
        assert_eq!(r.output, vec!["Aborted connection to megacorp-server-01".to_string()]);
        assert!(s.scheduler().is_idle());
        assert!(s.world().pending_connection().is_none());
        assert_eq!(
            s.run_until_idle(),
            vec![GameEvent::ConnectCancelled {
                host_id: "megacorp-server-01".into()
            }]
        );
        assert!(!s.execute("disconnect").success);
    }

    #[test]
    fn cancelled_connect_earns_no_mission_credit() {
        let mut s = scanned();
        let r = s.execute("connect server-01");
        assert!(r.success);
        assert!(!r.output.iter().any(|l| l.contains("Mission task complete")));
        s.execute("cancel");
        s.run_until_idle();
        assert!(!s.world().missions.is_completed("first-contact", "foothold"));
        assert_eq!(s.world().current_mission().unwrap().id, "first-contact");
    }

    #[test]
    fn canonical_host_name_completes_connect_task() {
        let mut s = scanned();
        assert!(s.execute("connect admin@megacorp-server-01").success);
        let events = s.run_until_idle();
        assert!(events.contains(&GameEvent::TaskCompleted {
            title: "Log into the MegaCorp web server".into()
        }));
        assert!(s.world().missions.is_completed("first-contact", "foothold"));
    }

    #[test]
    fn crack_unlocks_cracking_host() {
        let mut s = scanned();
        assert!(!s.execute("crack db-01").success);
        assert!(s.execute("install password-cracker").success);

        let r = s.execute("crack db-01");
        assert!(r.success);
        assert!(r.output[0].contains("4 ticks"));
        let events = s.run_until_idle();
        assert_eq!(
            events,
            vec![GameEvent::CredentialsCracked {
                host_id: "megacorp-db-01".into(),
                username: "dbadmin".into()
            }]
        );

        assert!(s.execute("connect dbadmin@db-01").success);
        s.run_until_idle();
        assert_eq!(s.world().current_remote_host(), Some("megacorp-db-01"));
    }

    #[test]
    fn crack_requires_discovery() {
        let mut s = session();
        s.execute("install password-cracker");
        let r = s.execute("crack db-01");
        assert_eq!(r.error, Some(ErrorTag::HostNotDiscovered));
    }

    #[test]
    fn vpn_mission_gate() {
        let mut s = scanned();
        s.execute("connect server-01");
        s.run_until_idle();
        s.execute("disconnect");

        assert_eq!(s.execute("connect intranet").error, Some(ErrorTag::VpnRequired));
        assert!(s.execute("vpn connect").success);
        assert!(s.execute("connect intranet").success);
    }

    #[test]
    fn escalation_flow() {
        let mut s = scanned();
        let r = s.execute("solve 42");
        assert!(!r.success);
        assert!(r.output[0].contains("generate one first"));

        assert!(s.execute("challenge math").success);
        let answer = s.escalation().current_challenge.clone().unwrap().answer;

        s.execute("solve wrong");
        let r = s.execute("solve wrong");
        assert!(r.output.iter().any(|l| l.starts_with("Hint:")));
        assert!(r.educational_content.is_none());
        let r = s.execute("solve wrong");
        assert!(r.educational_content.is_some());

        let r = s.execute(&format!("solve {answer}"));
        assert!(r.success);
        let password = s.escalation().root_password.clone().unwrap();

        assert!(!s.execute(&format!("sudo {password}")).success);
        s.execute("connect server-01");
        s.run_until_idle();
        assert!(s.execute(&format!("sudo {password}")).success);
        assert!(s.escalation().is_root);

        assert_eq!(s.execute("exit").output, vec!["Left root shell".to_string()]);
        assert!(s.world().current_remote_host().is_some());
        assert!(s.execute("exit").success);
        assert!(s.world().current_remote_host().is_none());
    }

    #[test]
    fn unknown_challenge_type() {
        let mut s = session();
        assert!(!s.execute("challenge riddle").success);
    }

    #[test]
    fn empty_registry_has_no_challenge() {
        let mut s = session().with_registry(ChallengeRegistry::new());
        let r = s.execute("challenge");
        assert!(!r.success);
    }

    #[test]
    fn difficulty_scales_new_actions() {
        let mut s = scanned();
        assert!(s.execute("difficulty hard").success);
        assert_eq!(s.difficulty(), DifficultyLevel::Hard);
        let r = s.execute("connect server-01");
        assert!(r.output[0].contains("5 ticks"));
        assert!(!s.execute("difficulty nightmare").success);
    }

    #[test]
    fn save_roundtrip_through_session() {
        let mut s = scanned();
        s.execute("connect server-01");
        s.run_until_idle();
        s.execute("difficulty easy");

        let save = s.to_save();
        let restored = Session::from_save(
            WorldContent::builtin().unwrap(),
            &save,
            GameConfig::default(),
        );
        assert_eq!(restored.difficulty(), DifficultyLevel::Easy);
        assert_eq!(restored.world().current_remote_host(), Some("megacorp-server-01"));
        assert_eq!(restored.to_save(), save);
    }

    #[test]
    fn saved_difficulty_outranks_config() {
        let save = SaveGame::new_game(&WorldContent::builtin().unwrap(), DifficultyLevel::Easy);
        let config = GameConfig {
            difficulty: DifficultyLevel::Expert,
            ..GameConfig::default()
        };
        let s = Session::from_save(WorldContent::builtin().unwrap(), &save, config);
        assert_eq!(s.difficulty(), DifficultyLevel::Easy);
    }

    #[test]
    fn status_and_hosts_render() {
        let mut s = scanned();
        s.execute("connect server-01");
        let status = s.execute("status");
        assert!(status.output.iter().any(|l| l.starts_with("Connecting: admin@megacorp-server-01")));
        let hosts = s.execute("hosts");
        assert!(hosts.output.iter().any(|l| l.starts_with("megacorp-server-01")));
    }
}
