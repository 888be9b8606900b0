//! Core events emitted by the reconciler

use nop_api::{ConditionStatus, ConditionType};
use nop_util::{ResourceName, ResourceUid};
use std::time::Duration;

/// Events emitted by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Resource added to the reconciler
    ResourceRegistered {
        name: ResourceName,
        uid: ResourceUid,
        restored: bool,
    },

    /// A different rule now governs at least one condition type
    ConditionsChanged {
        name: ResourceName,
        conditions: Vec<(ConditionType, ConditionStatus)>,
        age: Duration,
    },

    /// Observe reported a missing external resource and create was called
    ExternalCreated { name: ResourceName },

    /// Observe reported a stale external resource and update was called
    ExternalUpdated { name: ResourceName },

    /// Deletion marker set on a resource
    DeletionRequested { name: ResourceName },

    /// Resource observed as deleted and removed
    ResourceDeleted { name: ResourceName },

    /// A reconcile step failed for one resource
    ReconcileFailed { name: ResourceName, error: String },

    /// Policy was reloaded
    PolicyReloaded { resource_count: usize },
}

impl CoreEvent {
    /// Name of the resource the event concerns, if any
    pub fn resource(&self) -> Option<&ResourceName> {
        match self {
            CoreEvent::ResourceRegistered { name, .. }
            | CoreEvent::ConditionsChanged { name, .. }
            | CoreEvent::ExternalCreated { name }
            | CoreEvent::ExternalUpdated { name }
            | CoreEvent::DeletionRequested { name }
            | CoreEvent::ResourceDeleted { name }
            | CoreEvent::ReconcileFailed { name, .. } => Some(name),
            CoreEvent::PolicyReloaded { .. } => None,
        }
    }
}
