//! Concrete collaborator stores and the `World` that bundles them.

use crate::collab::{
    Capabilities, ConnectionStore, Discovery, FileSystemProvider, HostRegistry, Inventory,
    MissionTracker,
};
use crate::connection::{ConnectionState, CredentialVault, PendingConnection};
use crate::content::{CredentialRecord, HostRecord, Tool, WorldContent};
use crate::error::Result;
use crate::events::EventBus;
use crate::filesystem::{FileSystems, RemoteFileSystem};
use crate::mission::{Mission, MissionBoard};
use crate::types::UniqueList;

// ---------------------------------------------------------------------------
// Small stores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct HostCatalog {
    hosts: Vec<HostRecord>,
}

impl HostCatalog {
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self { hosts }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryLog {
    discovered: UniqueList,
}

impl DiscoveryLog {
    pub fn new(discovered: UniqueList) -> Self {
        Self { discovered }
    }

    pub fn discovered(&self) -> &UniqueList {
        &self.discovered
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    owned: UniqueList,
    catalog: Vec<Tool>,
}

impl InventoryStore {
    pub fn new(owned: UniqueList, catalog: Vec<Tool>) -> Self {
        Self { owned, catalog }
    }

    pub fn owned(&self) -> &UniqueList {
        &self.owned
    }

    pub fn catalog(&self) -> &[Tool] {
        &self.catalog
    }

    pub fn in_catalog(&self, id: &str) -> bool {
        self.catalog.iter().any(|t| t.id == id)
    }

    /// Returns true if the capability was newly granted.
    pub fn grant(&mut self, id: &str) -> bool {
        self.owned.insert(id)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Everything the game mutates, one store per collaborator.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub hosts: HostCatalog,
    pub discovery: DiscoveryLog,
    pub inventory: InventoryStore,
    pub missions: MissionBoard,
    pub connection: ConnectionState,
    pub filesystems: FileSystems,
    pub events: EventBus,
}

impl World {
    /// A fresh world: bundled credentials and starting inventory, nothing
    /// discovered, nothing connected.
    pub fn new(content: WorldContent) -> Self {
        let owned: UniqueList = content.starting_inventory.iter().cloned().collect();
        Self {
            hosts: HostCatalog::new(content.hosts),
            discovery: DiscoveryLog::default(),
            inventory: InventoryStore::new(owned, content.tools),
            missions: MissionBoard::new(content.missions, UniqueList::new()),
            connection: ConnectionState::new(CredentialVault::new(content.bundled_credentials)),
            filesystems: FileSystems::new(content.filesystems),
            events: EventBus::new(),
        }
    }
}

impl HostRegistry for World {
    fn get_host(&self, host_id: &str) -> Option<&HostRecord> {
        self.hosts.hosts.iter().find(|h| h.id == host_id)
    }

    fn all_hosts(&self) -> &[HostRecord] {
        &self.hosts.hosts
    }
}

impl Discovery for World {
    fn is_host_discovered(&self, host_id: &str) -> bool {
        self.discovery.discovered.contains(host_id)
    }

    fn mark_discovered(&mut self, host_id: &str) -> bool {
        self.discovery.discovered.insert(host_id)
    }
}

impl Inventory for World {
    fn owns_capability(&self, capability: &str) -> bool {
        self.inventory.owned.contains(capability)
    }
}

impl MissionTracker for World {
    fn current_mission(&self) -> Option<&Mission> {
        self.missions.current()
    }

    fn is_task_completed(&self, mission_id: &str, task_id: &str) -> bool {
        self.missions.is_completed(mission_id, task_id)
    }
}

impl ConnectionStore for World {
    fn current_remote_host(&self) -> Option<&str> {
        self.connection.current_remote_host()
    }

    fn get_credentials(&self, host_id: &str) -> Option<&CredentialRecord> {
        self.connection.credentials(host_id)
    }

    fn store_credentials(&mut self, record: CredentialRecord) {
        self.connection.vault_mut().store(record);
    }

    fn is_vpn_connected(&self) -> bool {
        self.connection.is_vpn_connected()
    }

    fn pending_connection(&self) -> Option<&PendingConnection> {
        self.connection.pending()
    }

    fn reserve(&mut self, pending: PendingConnection) {
        self.connection.reserve(pending);
    }

    fn release_reservation(&mut self) -> Option<PendingConnection> {
        self.connection.release_reservation()
    }

    fn set_connected(&mut self, host_id: &str, username: &str) {
        self.connection.set_connected(host_id, username);
    }
}

impl FileSystemProvider for World {
    fn resolve_file_system(&self, host_id: &str) -> Option<&RemoteFileSystem> {
        self.filesystems.resolve(host_id)
    }

    fn activate(&mut self, host_id: &str, username: &str) -> Result<()> {
        self.filesystems.activate(host_id, username)
    }
}

impl Capabilities for World {
    fn hosts(&self) -> &dyn HostRegistry {
        self
    }

    fn discovery(&self) -> &dyn Discovery {
        self
    }

    fn inventory(&self) -> &dyn Inventory {
        self
    }

    fn missions(&self) -> &dyn MissionTracker {
        self
    }

    fn connection(&self) -> &dyn ConnectionStore {
        self
    }

    fn connection_mut(&mut self) -> &mut dyn ConnectionStore {
        self
    }

    fn filesystems(&self) -> &dyn FileSystemProvider {
        self
    }

    fn filesystems_mut(&mut self) -> &mut dyn FileSystemProvider {
        self
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_has_bundled_credentials_only() {
        let world = World::new(WorldContent::builtin().unwrap());
        let cred = world.get_credentials("megacorp-server-01").unwrap();
        assert_eq!(cred.username, "admin");
        assert!(world.discovery.discovered().is_empty());
        assert!(world.current_remote_host().is_none());
    }

    #[test]
    fn grant_is_idempotent() {
        let mut world = World::new(WorldContent::builtin().unwrap());
        assert!(world.inventory.grant("firewall-bypass"));
        assert!(!world.inventory.grant("firewall-bypass"));
        assert!(world.owns_capability("firewall-bypass"));
    }
}
