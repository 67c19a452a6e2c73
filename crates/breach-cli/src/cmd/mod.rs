pub mod exec;
pub mod hosts;
pub mod init;
pub mod play;
pub mod state;

use anyhow::Context;
use breach_core::config::{GameConfig, WarnLevel};
use breach_core::content::WorldContent;
use breach_core::save::SaveGame;
use breach_core::Session;
use std::path::Path;

/// Load config, world content, and the save into a live session.
pub fn load_session(root: &Path) -> anyhow::Result<Session> {
    let config = GameConfig::load(root).context("failed to load config.yaml")?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => anyhow::bail!("invalid config: {}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    let content = WorldContent::load(root).context("failed to load world content")?;
    let save = SaveGame::load(root).context("failed to load save")?;
    Ok(Session::from_save(content, &save, config))
}

pub fn save_session(root: &Path, session: &Session) -> anyhow::Result<()> {
    session
        .to_save()
        .save(root)
        .context("failed to write save.yaml")
}
