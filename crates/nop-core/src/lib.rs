//! Condition scheduling engine and reconciler for nop-provider
//!
//! This crate is the heart of nopd, containing:
//! - Schedule evaluation (which timed rule governs each condition type)
//! - Condition application (replace-by-type merge into status)
//! - The simulated external client (observe/create/update/delete)
//! - The reconciler driving every resource on each poll

mod applier;
mod engine;
mod events;
mod external;
mod resource;
mod schedule;

pub use applier::*;
pub use engine::*;
pub use events::*;
pub use external::*;
pub use resource::*;
pub use schedule::*;
