//! Shared resource types for nop-provider
//!
//! This crate defines the data model shared by config, store and core:
//! - Conditions and condition sets (observed state)
//! - Timed condition rules (desired state)
//! - Resource metadata, status and lifecycle

mod condition;
mod rule;
mod types;

pub use condition::*;
pub use rule::*;
pub use types::*;

/// API group of the simulated managed resource
pub const NOP_RESOURCE_GROUP: &str = "nop.crossplane.io";

/// Kind of the simulated managed resource
pub const NOP_RESOURCE_KIND: &str = "NopResource";
