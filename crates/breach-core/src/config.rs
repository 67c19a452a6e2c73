use crate::error::Result;
use crate::paths;
use crate::types::{ActionKind, DifficultyLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DurationConfig
// ---------------------------------------------------------------------------

/// Base durations in ticks, before the difficulty multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationConfig {
    #[serde(default = "default_connect_ticks")]
    pub connect: u64,
    #[serde(default = "default_scan_ticks")]
    pub scan: u64,
    #[serde(default = "default_crack_ticks")]
    pub crack: u64,
}

fn default_connect_ticks() -> u64 {
    crate::authorizer::CONNECT_BASE_TICKS
}

fn default_scan_ticks() -> u64 {
    2
}

fn default_crack_ticks() -> u64 {
    4
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            connect: default_connect_ticks(),
            scan: default_scan_ticks(),
            crack: default_crack_ticks(),
        }
    }
}

impl DurationConfig {
    pub fn base_for(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Connect => self.connect,
            ActionKind::Scan => self.scan,
            ActionKind::Crack => self.crack,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Difficulty for new games. A game in progress keeps the difficulty
    /// stored in its save; change it with the in-game `difficulty` command.
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    /// Wall-clock length of one tick in the interactive shell.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    #[serde(default)]
    pub durations: DurationConfig,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_version() -> u32 {
    1
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_prompt() -> String {
    "breach$ ".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            difficulty: DifficultyLevel::default(),
            tick_millis: default_tick_millis(),
            durations: DurationConfig::default(),
            prompt: default_prompt(),
        }
    }
}

impl GameConfig {
    /// Missing file means defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: GameConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.tick_millis == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tick_millis must be greater than zero".to_string(),
            });
        }

        for kind in [ActionKind::Connect, ActionKind::Scan, ActionKind::Crack] {
            if self.durations.base_for(kind) == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("durations.{kind} is 0; the action completes on the next tick"),
                });
            }
        }

        warnings
    }
}
