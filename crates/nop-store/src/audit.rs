//! Recorded event types

use chrono::{DateTime, Utc};
use nop_api::{ConditionStatus, ConditionType};
use nop_util::{ResourceName, ResourceUid};
use serde::{Deserialize, Serialize};

/// Types of recorded events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Daemon started
    ProviderStarted,

    /// Daemon stopped
    ProviderStopped,

    /// Config loaded/reloaded
    ConfigLoaded { resource_count: usize },

    /// Resource registered with the reconciler
    ResourceRegistered {
        name: ResourceName,
        uid: ResourceUid,
        /// True when status was restored from a previous run
        restored: bool,
    },

    /// The governing rules of a resource changed
    ConditionsChanged {
        name: ResourceName,
        conditions: Vec<(ConditionType, ConditionStatus)>,
    },

    /// Create was called on the external client
    CreatedExternalResource { name: ResourceName },

    /// Update was called on the external client
    UpdatedExternalResource { name: ResourceName },

    /// Deletion requested for a resource
    DeletionRequested { name: ResourceName },

    /// Resource observed as deleted and finalized
    ResourceDeleted { name: ResourceName },

    /// A reconcile step failed
    ReconcileError { name: ResourceName, error: String },
}

/// Full recorded event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: nop_util::now(),
            event,
        }
    }
}
