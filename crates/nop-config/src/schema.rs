//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Declared NopResources
    #[serde(default)]
    pub resources: Vec<RawResource>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// How often every resource is reconciled, as duration text (default: "1s")
    pub poll_interval: Option<String>,

    /// Data directory for the status store
    pub data_dir: Option<PathBuf>,
}

/// Raw NopResource declaration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawResource {
    /// Unique resource name
    pub name: String,

    /// External name annotation (defaults to the resource name)
    pub external_name: Option<String>,

    /// Timed condition rules, in precedence order
    #[serde(default)]
    pub condition_after: Vec<RawConditionAfter>,
}

/// "After `time`, condition `condition_type` becomes `condition_status`"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConditionAfter {
    /// Duration text, e.g. "10s" or "1m30s"
    pub time: String,

    /// Condition type, e.g. "Ready" or "Synced"
    pub condition_type: String,

    /// "True", "False" or "Unknown"
    pub condition_status: String,
}
