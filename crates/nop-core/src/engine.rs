//! Reconciler driving every registered resource

use chrono::{DateTime, Utc};
use nop_api::{Condition, ResourceLifecycle, ResourceView};
use nop_config::{Policy, ResourceDecl};
use nop_store::{AuditEvent, AuditEventType, Store};
use nop_util::{NopError, ResourceName, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{Connector, CoreEvent, ManagedObject, NopResource};

/// What a single reconcile step did to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Resource exists and is up to date; its schedule was applied
    Observed { conditions_changed: bool },
    /// Resource was missing externally and create was called
    Created,
    /// Resource was stale externally and update was called
    Updated,
    /// Deletion marker set and delete was called
    Deleting,
    /// Resource observed as gone and finalized
    Deleted,
}

impl ReconcileOutcome {
    pub fn lifecycle(&self) -> ResourceLifecycle {
        match self {
            ReconcileOutcome::Deleting => ResourceLifecycle::Deleting,
            ReconcileOutcome::Deleted => ResourceLifecycle::ObservedDeleted,
            _ => ResourceLifecycle::ObservedExisting,
        }
    }
}

/// Outcome of reconciling one resource plus the events it produced
#[derive(Debug, Clone)]
pub struct ReconcileStep {
    pub outcome: ReconcileOutcome,
    pub events: Vec<CoreEvent>,
}

/// Run one reconcile step against a managed object.
///
/// A type mismatch is reported by the connector before anything is touched.
/// Persistence and event recording are left to the caller.
pub fn reconcile_object(
    connector: &dyn Connector,
    mg: &mut ManagedObject,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
    let mut client = connector.connect(mg)?;

    let cr = mg.as_nop_mut()?;
    if cr.meta.external_name.is_none() {
        cr.meta.external_name = Some(cr.meta.name.to_string());
    }
    let before = cr.status.conditions.clone();

    let observation = client.observe(mg, now)?;
    let cr = mg.as_nop_mut()?;

    if cr.meta.was_deleted() {
        cr.status.conditions.set(Condition::deleting(now));
        if observation.resource_exists {
            client.delete(mg, now)?;
            return Ok(ReconcileOutcome::Deleting);
        }
        return Ok(ReconcileOutcome::Deleted);
    }

    if !observation.resource_exists {
        client.create(mg, now)?;
        return Ok(ReconcileOutcome::Created);
    }

    if !observation.resource_up_to_date {
        client.update(mg, now)?;
        return Ok(ReconcileOutcome::Updated);
    }

    let conditions_changed = !cr.status.conditions.same_state(&before);
    Ok(ReconcileOutcome::Observed { conditions_changed })
}

/// Owns the registered resources and reconciles them on every tick
pub struct Reconciler {
    connector: Arc<dyn Connector>,
    store: Arc<dyn Store>,
    resources: BTreeMap<ResourceName, ManagedObject>,
}

impl Reconciler {
    pub fn new(connector: Arc<dyn Connector>, store: Arc<dyn Store>) -> Self {
        info!("Reconciler initialized");

        Self {
            connector,
            store,
            resources: BTreeMap::new(),
        }
    }

    /// Register a resource, restoring its persisted status if the store has one
    pub fn register(&mut self, resource: NopResource) -> Result<CoreEvent> {
        let name = resource.name().clone();
        if self.resources.contains_key(&name) {
            return Err(NopError::ResourceAlreadyRegistered(name));
        }

        let persisted = self
            .store
            .load_resource(&name)
            .map_err(|e| NopError::store(e.to_string()))?;

        let restored = persisted.is_some();
        let resource = match persisted {
            Some(record) => {
                let declared_external_name = resource.meta.external_name.clone();
                let mut restored = NopResource::from_record(record, resource.spec.rules);
                if restored.meta.external_name.is_none() {
                    restored.meta.external_name = declared_external_name;
                }
                restored
            }
            None => resource,
        };

        self.store
            .save_resource(&resource.to_record())
            .map_err(|e| NopError::store(e.to_string()))?;

        info!(
            resource = %name,
            uid = %resource.meta.uid,
            created = %nop_util::format_datetime_full(&resource.meta.creation_time),
            rules = resource.spec.rules.len(),
            restored,
            "Resource registered"
        );

        let event = CoreEvent::ResourceRegistered {
            name: name.clone(),
            uid: resource.meta.uid,
            restored,
        };
        self.resources.insert(name, resource.into());
        self.record(&event);

        Ok(event)
    }

    /// Register a resource declared in config, created at `now` unless restored
    pub fn register_decl(&mut self, decl: &ResourceDecl, now: DateTime<Utc>) -> Result<CoreEvent> {
        self.register(NopResource::from_decl(decl, now))
    }

    /// Bring registered resources in line with a policy.
    ///
    /// New declarations are registered, existing ones pick up their new rules,
    /// and resources that are no longer declared are marked for deletion. This
    /// includes records left in the store by a previous configuration.
    pub fn reload(&mut self, policy: &Policy, now: DateTime<Utc>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        for decl in &policy.resources {
            match self.resources.get_mut(&decl.name) {
                Some(ManagedObject::Nop(cr)) => {
                    if cr.spec.rules != decl.rules {
                        info!(resource = %decl.name, rules = decl.rules.len(), "Resource rules updated");
                        cr.spec.rules = decl.rules.clone();
                    }
                }
                Some(ManagedObject::Foreign { kind, .. }) => {
                    warn!(resource = %decl.name, kind = %kind, "Name taken by a foreign object");
                }
                None => match self.register_decl(decl, now) {
                    Ok(event) => events.push(event),
                    Err(e) => events.push(self.failure(&decl.name, &e)),
                },
            }
        }

        let declared: BTreeSet<&ResourceName> = policy.resources.iter().map(|d| &d.name).collect();
        self.adopt_orphans(&declared);

        let removed: Vec<ResourceName> = self
            .resources
            .keys()
            .filter(|name| !declared.contains(name))
            .cloned()
            .collect();
        for name in removed {
            match self.request_deletion(&name, now) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => events.push(self.failure(&name, &e)),
            }
        }

        let resource_count = policy.resources.len();
        info!(resource_count, "Policy applied");

        let event = CoreEvent::PolicyReloaded { resource_count };
        self.record(&event);
        events.push(event);
        events
    }

    /// Register persisted records that no declaration claims, so they can be deleted
    fn adopt_orphans(&mut self, declared: &BTreeSet<&ResourceName>) {
        let records = match self.store.list_resources() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to list persisted resources");
                return;
            }
        };

        for record in records {
            let name = record.meta.name.clone();
            if declared.contains(&name) || self.resources.contains_key(&name) {
                continue;
            }
            debug!(resource = %name, "Adopting undeclared persisted resource");
            self.resources
                .insert(name, NopResource::from_record(record, Vec::new()).into());
        }
    }

    /// Set the deletion marker on a resource and call delete on it.
    ///
    /// Returns `None` when the resource was already being deleted.
    pub fn request_deletion(
        &mut self,
        name: &ResourceName,
        now: DateTime<Utc>,
    ) -> Result<Option<CoreEvent>> {
        let connector = Arc::clone(&self.connector);
        let store = Arc::clone(&self.store);

        let mg = self
            .resources
            .get_mut(name)
            .ok_or_else(|| NopError::ResourceNotFound(name.clone()))?;

        let mut client = connector.connect(mg)?;
        let cr = mg.as_nop_mut()?;
        if cr.meta.was_deleted() {
            debug!(resource = %name, "Deletion already requested");
            return Ok(None);
        }
        cr.meta.deletion_time = Some(now);

        client.delete(mg, now)?;

        let record = mg.as_nop()?.to_record();
        store
            .save_resource(&record)
            .map_err(|e| NopError::store(e.to_string()))?;

        info!(resource = %name, "Deletion requested");

        let event = CoreEvent::DeletionRequested { name: name.clone() };
        self.record(&event);
        Ok(Some(event))
    }

    /// Reconcile a single resource, persist its status and record its events
    pub fn reconcile(&mut self, name: &ResourceName, now: DateTime<Utc>) -> Result<ReconcileStep> {
        let connector = Arc::clone(&self.connector);
        let store = Arc::clone(&self.store);

        let mg = self
            .resources
            .get_mut(name)
            .ok_or_else(|| NopError::ResourceNotFound(name.clone()))?;

        let outcome = reconcile_object(connector.as_ref(), mg, now)?;
        let cr = mg.as_nop()?;

        let mut events = Vec::new();
        match outcome {
            ReconcileOutcome::Observed {
                conditions_changed: true,
            } => {
                let age = nop_util::elapsed_since(cr.meta.creation_time, now);
                info!(
                    resource = %name,
                    age = %nop_util::format_duration(age),
                    conditions = ?cr.status.conditions.summary(),
                    "Conditions changed"
                );
                events.push(CoreEvent::ConditionsChanged {
                    name: name.clone(),
                    conditions: cr.status.conditions.summary(),
                    age,
                });
            }
            ReconcileOutcome::Observed { .. } => {}
            ReconcileOutcome::Created => {
                events.push(CoreEvent::ExternalCreated { name: name.clone() });
            }
            ReconcileOutcome::Updated => {
                events.push(CoreEvent::ExternalUpdated { name: name.clone() });
            }
            ReconcileOutcome::Deleting => {
                debug!(resource = %name, "Waiting for external deletion");
            }
            ReconcileOutcome::Deleted => {
                events.push(CoreEvent::ResourceDeleted { name: name.clone() });
            }
        }

        if outcome == ReconcileOutcome::Deleted {
            self.resources.remove(name);
            store
                .delete_resource(name)
                .map_err(|e| NopError::store(e.to_string()))?;
            info!(resource = %name, "Resource deleted");
        } else {
            store
                .save_resource(&cr.to_record())
                .map_err(|e| NopError::store(e.to_string()))?;
        }

        for event in &events {
            self.record(event);
        }

        Ok(ReconcileStep { outcome, events })
    }

    /// Reconcile every registered resource.
    ///
    /// A failing resource is logged and reported; the others still run.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<CoreEvent> {
        let names: Vec<ResourceName> = self.resources.keys().cloned().collect();
        let mut events = Vec::new();

        for name in names {
            match self.reconcile(&name, now) {
                Ok(step) => events.extend(step.events),
                Err(e) => events.push(self.failure(&name, &e)),
            }
        }

        events
    }

    /// Views of every registered NopResource, ordered by name
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<ResourceView> {
        self.resources
            .values()
            .filter_map(|mg| mg.as_nop().ok())
            .map(|cr| cr.view(now))
            .collect()
    }

    pub fn get(&self, name: &ResourceName) -> Option<&NopResource> {
        self.resources.get(name).and_then(|mg| mg.as_nop().ok())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn failure(&self, name: &ResourceName, error: &NopError) -> CoreEvent {
        warn!(resource = %name, error = %error, "Reconcile failed");
        let event = CoreEvent::ReconcileFailed {
            name: name.clone(),
            error: error.to_string(),
        };
        self.record(&event);
        event
    }

    fn record(&self, event: &CoreEvent) {
        let audit = match event {
            CoreEvent::ResourceRegistered {
                name,
                uid,
                restored,
            } => AuditEventType::ResourceRegistered {
                name: name.clone(),
                uid: *uid,
                restored: *restored,
            },
            CoreEvent::ConditionsChanged {
                name, conditions, ..
            } => AuditEventType::ConditionsChanged {
                name: name.clone(),
                conditions: conditions.clone(),
            },
            CoreEvent::ExternalCreated { name } => {
                AuditEventType::CreatedExternalResource { name: name.clone() }
            }
            CoreEvent::ExternalUpdated { name } => {
                AuditEventType::UpdatedExternalResource { name: name.clone() }
            }
            CoreEvent::DeletionRequested { name } => {
                AuditEventType::DeletionRequested { name: name.clone() }
            }
            CoreEvent::ResourceDeleted { name } => {
                AuditEventType::ResourceDeleted { name: name.clone() }
            }
            CoreEvent::ReconcileFailed { name, error } => AuditEventType::ReconcileError {
                name: name.clone(),
                error: error.clone(),
            },
            CoreEvent::PolicyReloaded { resource_count } => AuditEventType::ConfigLoaded {
                resource_count: *resource_count,
            },
        };

        if let Err(e) = self.store.append_audit(AuditEvent::new(audit)) {
            warn!(error = %e, "Failed to record event");
        }
    }
}
