//! Simulated external client for NopResources
//!
//! There is no backing system. Observing a resource runs the condition
//! schedule against its age, and the remaining operations only log.

use chrono::{DateTime, Utc};
use nop_api::Condition;
use nop_util::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{apply_schedule, ManagedObject};

/// Secret material an external resource exposes, keyed by field name
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Result of observing the external resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// False tells the reconciler to create the resource, or that deletion finished
    pub resource_exists: bool,
    /// False tells the reconciler to update the resource
    pub resource_up_to_date: bool,
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// Operations the reconciler performs against an external resource.
///
/// Every method rejects objects that are not NopResources before touching them.
pub trait ExternalClient {
    fn observe(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>)
    -> Result<ExternalObservation>;

    fn create(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>) -> Result<ExternalCreation>;

    fn update(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>) -> Result<ExternalUpdate>;

    fn delete(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>) -> Result<()>;
}

/// Produces an [`ExternalClient`] for a managed object
pub trait Connector: Send + Sync {
    fn connect(&self, mg: &ManagedObject) -> Result<Box<dyn ExternalClient>>;
}

/// Connector for NopResources; needs no credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NopConnector;

impl Connector for NopConnector {
    fn connect(&self, mg: &ManagedObject) -> Result<Box<dyn ExternalClient>> {
        let cr = mg.as_nop()?;
        debug!(resource = %cr.name(), "Connecting to simulated external resource");
        Ok(Box::new(NopExternal))
    }
}

/// External client whose observed state is driven by elapsed time
#[derive(Debug, Clone, Copy, Default)]
pub struct NopExternal;

impl ExternalClient for NopExternal {
    fn observe(
        &mut self,
        mg: &mut ManagedObject,
        now: DateTime<Utc>,
    ) -> Result<ExternalObservation> {
        let cr = mg.as_nop_mut()?;

        if cr.meta.was_deleted() {
            debug!(resource = %cr.name(), "Deletion marker set, skipping schedule");
            return Ok(ExternalObservation {
                resource_exists: false,
                resource_up_to_date: true,
                connection_details: ConnectionDetails::new(),
            });
        }

        let changed = apply_schedule(cr, now);
        if !changed.is_empty() {
            debug!(
                resource = %cr.name(),
                age = %nop_util::format_duration(nop_util::elapsed_since(cr.meta.creation_time, now)),
                conditions = ?cr.status.conditions.summary(),
                "Governing rules changed"
            );
        }

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            connection_details: ConnectionDetails::new(),
        })
    }

    fn create(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>) -> Result<ExternalCreation> {
        let cr = mg.as_nop_mut()?;
        info!(resource = %cr.name(), uid = %cr.meta.uid, "Creating external resource");
        cr.status.conditions.set(Condition::creating(now));
        Ok(ExternalCreation::default())
    }

    fn update(&mut self, mg: &mut ManagedObject, _now: DateTime<Utc>) -> Result<ExternalUpdate> {
        let cr = mg.as_nop()?;
        info!(resource = %cr.name(), uid = %cr.meta.uid, "Updating external resource");
        Ok(ExternalUpdate::default())
    }

    fn delete(&mut self, mg: &mut ManagedObject, now: DateTime<Utc>) -> Result<()> {
        let cr = mg.as_nop_mut()?;
        info!(resource = %cr.name(), uid = %cr.meta.uid, "Deleting external resource");
        cr.status.conditions.set(Condition::deleting(now));
        Ok(())
    }
}
