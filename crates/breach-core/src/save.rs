//! Save-game persistence.
//!
//! Every set-like store is written as a `UniqueList`, so the file is plain
//! YAML sequences in first-seen order. `SaveGame::default()` is the empty
//! state: hydrating it and dehydrating the result gives it back unchanged.
//! Bundled credentials and the starting inventory come from world content,
//! not from the save. An in-flight connection is never saved.

use crate::connection::RemoteSession;
use crate::content::{CredentialRecord, CredentialSource, WorldContent};
use crate::error::{BreachError, Result};
use crate::escalation::EscalationState;
use crate::hosts::canonicalize;
use crate::mission::MissionBoard;
use crate::paths;
use crate::types::{DifficultyLevel, UniqueList};
use crate::world::{DiscoveryLog, InventoryStore, World};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub discovered_hosts: UniqueList,
    #[serde(default)]
    pub capabilities: UniqueList,
    #[serde(default)]
    pub cracked_credentials: Vec<CredentialRecord>,
    #[serde(default)]
    pub completed_tasks: UniqueList,
    #[serde(default)]
    pub vpn_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<RemoteSession>,
    #[serde(default)]
    pub escalation: EscalationState,
}

fn default_version() -> u32 {
    1
}

impl SaveGame {
    /// Save for a brand-new game: starting inventory, chosen difficulty.
    pub fn new_game(content: &WorldContent, difficulty: DifficultyLevel) -> Self {
        Self {
            version: default_version(),
            difficulty,
            capabilities: content.starting_inventory.iter().cloned().collect(),
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::save_path(root);
        if !path.exists() {
            return Err(BreachError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::save_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Hydrate / dehydrate
    // -----------------------------------------------------------------------

    pub fn dehydrate(
        world: &World,
        difficulty: DifficultyLevel,
        escalation: &EscalationState,
    ) -> Self {
        Self {
            version: default_version(),
            difficulty,
            discovered_hosts: world.discovery.discovered().clone(),
            capabilities: world.inventory.owned().clone(),
            cracked_credentials: world
                .connection
                .vault()
                .records()
                .iter()
                .filter(|r| r.source == CredentialSource::Cracked)
                .cloned()
                .collect(),
            completed_tasks: world.missions.completed().clone(),
            vpn_connected: world.connection.is_vpn_connected(),
            connection: world.connection.session().cloned(),
            escalation: escalation.clone(),
        }
    }
}

impl World {
    /// Rebuild a world from content plus saved progress. Host ids in the
    /// save are folded through `canonicalize`, so saves written under legacy
    /// names load onto the renamed hosts.
    pub fn hydrate(content: WorldContent, save: &SaveGame) -> Self {
        let missions = content.missions.clone();
        let mut world = World::new(content);

        world.discovery = DiscoveryLog::new(
            save.discovered_hosts
                .iter()
                .map(|id| canonicalize(id))
                .collect(),
        );
        world.inventory = InventoryStore::new(
            save.capabilities.clone(),
            world.inventory.catalog().to_vec(),
        );
        world.missions = MissionBoard::new(missions, save.completed_tasks.clone());
        for record in &save.cracked_credentials {
            world.connection.vault_mut().store(CredentialRecord {
                host_id: canonicalize(&record.host_id),
                ..record.clone()
            });
        }
        world.connection.set_vpn_connected(save.vpn_connected);

        if let Some(session) = &save.connection {
            let host_id = canonicalize(&session.host_id);
            match world.filesystems.activate(&host_id, &session.username) {
                Ok(()) => world.connection.set_connected(&host_id, &session.username),
                Err(e) => tracing::warn!(host = %host_id, error = %e, "dropping saved session"),
            }
        }

        world
    }
}
