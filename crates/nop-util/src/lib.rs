//! Shared utilities for nop-provider
//!
//! This crate provides:
//! - ID types (ResourceName, ResourceUid)
//! - Time utilities (mockable wall clock, duration text parsing and formatting)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
