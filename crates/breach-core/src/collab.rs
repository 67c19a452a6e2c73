//! Collaborator interfaces the authorizer and the scheduled actions consume.
//!
//! `Capabilities` bundles them so the authorizer receives one explicit set of
//! dependencies instead of reaching for global stores.

use crate::connection::PendingConnection;
use crate::content::{CredentialRecord, HostRecord};
use crate::error::Result;
use crate::events::EventBus;
use crate::filesystem::RemoteFileSystem;
use crate::mission::Mission;

pub trait HostRegistry {
    fn get_host(&self, host_id: &str) -> Option<&HostRecord>;
    fn all_hosts(&self) -> &[HostRecord];
}

pub trait Discovery {
    fn is_host_discovered(&self, host_id: &str) -> bool;
    /// Returns true if the host was not discovered before.
    fn mark_discovered(&mut self, host_id: &str) -> bool;
}

pub trait Inventory {
    fn owns_capability(&self, capability: &str) -> bool;
}

pub trait MissionTracker {
    fn current_mission(&self) -> Option<&Mission>;
    fn is_task_completed(&self, mission_id: &str, task_id: &str) -> bool;
}

pub trait ConnectionStore {
    fn current_remote_host(&self) -> Option<&str>;
    fn get_credentials(&self, host_id: &str) -> Option<&CredentialRecord>;
    fn store_credentials(&mut self, record: CredentialRecord);
    fn is_vpn_connected(&self) -> bool;
    fn pending_connection(&self) -> Option<&PendingConnection>;
    fn reserve(&mut self, pending: PendingConnection);
    fn release_reservation(&mut self) -> Option<PendingConnection>;
    fn set_connected(&mut self, host_id: &str, username: &str);
}

pub trait FileSystemProvider {
    fn resolve_file_system(&self, host_id: &str) -> Option<&RemoteFileSystem>;
    fn activate(&mut self, host_id: &str, username: &str) -> Result<()>;
}

pub trait Capabilities {
    fn hosts(&self) -> &dyn HostRegistry;
    fn discovery(&self) -> &dyn Discovery;
    fn inventory(&self) -> &dyn Inventory;
    fn missions(&self) -> &dyn MissionTracker;
    fn connection(&self) -> &dyn ConnectionStore;
    fn connection_mut(&mut self) -> &mut dyn ConnectionStore;
    fn filesystems(&self) -> &dyn FileSystemProvider;
    fn filesystems_mut(&mut self) -> &mut dyn FileSystemProvider;
    fn events(&self) -> &EventBus;
}
