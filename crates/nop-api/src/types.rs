//! Resource metadata, status and lifecycle types

use chrono::{DateTime, Utc};
use nop_util::{ResourceName, ResourceUid};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConditionSet;

/// Object metadata of a managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub name: ResourceName,
    pub uid: ResourceUid,
    /// Fixed when the resource is first created
    pub creation_time: DateTime<Utc>,
    /// Name of the external resource; defaults to `name` once initialized
    #[serde(default)]
    pub external_name: Option<String>,
    /// Deletion marker. Once set, condition scheduling stops for good.
    #[serde(default)]
    pub deletion_time: Option<DateTime<Utc>>,
}

impl ResourceMeta {
    pub fn new(name: ResourceName, creation_time: DateTime<Utc>) -> Self {
        Self {
            name,
            uid: ResourceUid::new(),
            creation_time,
            external_name: None,
            deletion_time: None,
        }
    }

    pub fn was_deleted(&self) -> bool {
        self.deletion_time.is_some()
    }
}

/// Observed status of a managed resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub conditions: ConditionSet,
}

/// Persisted form of a resource: everything but its declared rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub meta: ResourceMeta,
    pub status: ResourceStatus,
}

/// External-facing lifecycle of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLifecycle {
    /// Exists; conditions are scheduled on every poll
    ObservedExisting,
    /// Deletion requested; terminal Deleting condition set
    Deleting,
    /// Reported as gone; finalized
    ObservedDeleted,
}

/// Point-in-time view of a resource for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceView {
    pub name: ResourceName,
    pub uid: ResourceUid,
    pub lifecycle: ResourceLifecycle,
    pub age: Duration,
    pub rule_count: usize,
    /// Time until the next rule becomes eligible; none once all have applied
    #[serde(default)]
    pub next_transition: Option<Duration>,
    pub status: ResourceStatus,
}
