//! Store trait definitions

use nop_api::ResourceRecord;
use nop_util::ResourceName;

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Recorded events

    /// Append an event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Resource status

    /// Load the persisted record of a resource
    fn load_resource(&self, name: &ResourceName) -> StoreResult<Option<ResourceRecord>>;

    /// Insert or replace the persisted record of a resource
    fn save_resource(&self, record: &ResourceRecord) -> StoreResult<()>;

    /// Remove a resource record; removing a missing record is not an error
    fn delete_resource(&self, name: &ResourceName) -> StoreResult<()>;

    /// All persisted records, ordered by name
    fn list_resources(&self) -> StoreResult<Vec<ResourceRecord>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
