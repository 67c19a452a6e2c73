use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Connected { host_id: String, username: String },
    Disconnected { host_id: String },
    ConnectCancelled { host_id: String },
    HostDiscovered { host_id: String },
    CredentialsCracked { host_id: String, username: String },
    ActionFailed { label: String, reason: String },
    TaskCompleted { title: String },
}

impl GameEvent {
    /// One-line rendering for the terminal.
    pub fn describe(&self) -> String {
        match self {
            GameEvent::Connected { host_id, username } => {
                format!("Connected to {host_id} as {username}")
            }
            GameEvent::Disconnected { host_id } => format!("Connection to {host_id} closed"),
            GameEvent::ConnectCancelled { host_id } => {
                format!("Connection attempt to {host_id} aborted")
            }
            GameEvent::HostDiscovered { host_id } => format!("Discovered host: {host_id}"),
            GameEvent::CredentialsCracked { host_id, username } => {
                format!("Cracked credentials for {username}@{host_id}")
            }
            GameEvent::ActionFailed { label, reason } => format!("{label} failed: {reason}"),
            GameEvent::TaskCompleted { title } => format!("Mission task complete: {title}"),
        }
    }
}

/// Fan-out channel for game events. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn emit(&self, event: GameEvent) {
        tracing::debug!(?event, "game event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}

/// Drain everything currently buffered on `rx` without waiting.
pub fn drain(rx: &mut broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "event receiver lagged");
            }
            Err(_) => break,
        }
    }
    out
}
