//! The NopResource managed object

use chrono::{DateTime, Utc};
use nop_api::{
    ConditionRule, ConditionSet, ResourceLifecycle, ResourceMeta, ResourceRecord, ResourceStatus,
    ResourceView, NOP_RESOURCE_KIND,
};
use nop_config::ResourceDecl;
use nop_util::{NopError, ResourceName, Result};

use crate::next_transition;

/// Capability the condition scheduler needs from a resource
pub trait ScheduledResource {
    fn creation_time(&self) -> DateTime<Utc>;

    fn rules(&self) -> &[ConditionRule];

    fn conditions_mut(&mut self) -> &mut ConditionSet;

    /// Whether the resource carries a deletion marker
    fn was_deleted(&self) -> bool;
}

/// Desired state of a NopResource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NopResourceSpec {
    /// Timed rules in declaration order
    pub rules: Vec<ConditionRule>,
}

/// A simulated managed resource whose conditions follow its age
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NopResource {
    pub meta: ResourceMeta,
    pub spec: NopResourceSpec,
    pub status: ResourceStatus,
}

impl NopResource {
    /// Create a fresh resource
    pub fn new(name: ResourceName, rules: Vec<ConditionRule>, creation_time: DateTime<Utc>) -> Self {
        Self {
            meta: ResourceMeta::new(name, creation_time),
            spec: NopResourceSpec { rules },
            status: ResourceStatus::default(),
        }
    }

    /// Create a fresh resource from a config declaration
    pub fn from_decl(decl: &ResourceDecl, creation_time: DateTime<Utc>) -> Self {
        let mut resource = Self::new(decl.name.clone(), decl.rules.clone(), creation_time);
        resource.meta.external_name = decl.external_name.clone();
        resource
    }

    /// Rebuild a resource from its persisted record and current rules
    pub fn from_record(record: ResourceRecord, rules: Vec<ConditionRule>) -> Self {
        Self {
            meta: record.meta,
            spec: NopResourceSpec { rules },
            status: record.status,
        }
    }

    /// Persisted form (rules live in config, not in the store)
    pub fn to_record(&self) -> ResourceRecord {
        ResourceRecord {
            meta: self.meta.clone(),
            status: self.status.clone(),
        }
    }

    pub fn name(&self) -> &ResourceName {
        &self.meta.name
    }

    pub fn lifecycle(&self) -> ResourceLifecycle {
        if self.meta.was_deleted() {
            ResourceLifecycle::Deleting
        } else {
            ResourceLifecycle::ObservedExisting
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> ResourceView {
        let age = nop_util::elapsed_since(self.meta.creation_time, now);
        // Deleted resources are no longer scheduled
        let pending = if self.meta.was_deleted() {
            None
        } else {
            next_transition(&self.spec.rules, age)
        };

        ResourceView {
            name: self.meta.name.clone(),
            uid: self.meta.uid,
            lifecycle: self.lifecycle(),
            age,
            rule_count: self.spec.rules.len(),
            next_transition: pending,
            status: self.status.clone(),
        }
    }
}

impl ScheduledResource for NopResource {
    fn creation_time(&self) -> DateTime<Utc> {
        self.meta.creation_time
    }

    fn rules(&self) -> &[ConditionRule] {
        &self.spec.rules
    }

    fn conditions_mut(&mut self) -> &mut ConditionSet {
        &mut self.status.conditions
    }

    fn was_deleted(&self) -> bool {
        self.meta.was_deleted()
    }
}

/// Any object handed to the provider by the reconciler.
///
/// The provider only manages `Nop`; other kinds are rejected with
/// [`NopError::NotNopResource`] before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedObject {
    Nop(NopResource),
    Foreign { kind: String, name: ResourceName },
}

impl ManagedObject {
    pub fn kind(&self) -> &str {
        match self {
            ManagedObject::Nop(_) => NOP_RESOURCE_KIND,
            ManagedObject::Foreign { kind, .. } => kind,
        }
    }

    pub fn name(&self) -> &ResourceName {
        match self {
            ManagedObject::Nop(cr) => cr.name(),
            ManagedObject::Foreign { name, .. } => name,
        }
    }

    pub fn as_nop(&self) -> Result<&NopResource> {
        match self {
            ManagedObject::Nop(cr) => Ok(cr),
            ManagedObject::Foreign { kind, .. } => Err(NopError::not_nop_resource(kind.as_str())),
        }
    }

    pub fn as_nop_mut(&mut self) -> Result<&mut NopResource> {
        match self {
            ManagedObject::Nop(cr) => Ok(cr),
            ManagedObject::Foreign { kind, .. } => Err(NopError::not_nop_resource(kind.as_str())),
        }
    }
}

impl From<NopResource> for ManagedObject {
    fn from(cr: NopResource) -> Self {
        ManagedObject::Nop(cr)
    }
}
