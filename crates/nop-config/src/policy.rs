//! Validated policy structures

use crate::schema::{RawConfig, RawDaemonConfig, RawResource};
use nop_api::{ConditionRule, ConditionStatus};
use nop_util::{parse_duration_text, ResourceName};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Poll interval used when the config does not set one
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Validated policy ready for use by the reconciler
#[derive(Debug, Clone)]
pub struct Policy {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// Declared resources, in config order
    pub resources: Vec<ResourceDecl>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            resources: raw.resources.into_iter().map(ResourceDecl::from_raw).collect(),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub poll_interval: Duration,
    pub data_dir: PathBuf,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        let poll_interval = raw
            .poll_interval
            .as_deref()
            .and_then(|s| parse_duration_text(s).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Self {
            poll_interval,
            data_dir: raw.data_dir.unwrap_or_else(nop_util::data_dir_without_env),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            data_dir: nop_util::data_dir_without_env(),
        }
    }
}

/// Validated resource declaration
#[derive(Debug, Clone)]
pub struct ResourceDecl {
    pub name: ResourceName,
    pub external_name: Option<String>,
    /// Timed rules in declaration order; order decides ties
    pub rules: Vec<ConditionRule>,
}

impl ResourceDecl {
    fn from_raw(raw: RawResource) -> Self {
        let rules = raw
            .condition_after
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                // Validation already rejected unknown statuses
                let status = r
                    .condition_status
                    .parse::<ConditionStatus>()
                    .unwrap_or(ConditionStatus::Unknown);

                let parsed = ConditionRule::parse(&r.time, r.condition_type, status);
                if let Some(error) = &parsed.threshold_error {
                    warn!(
                        resource = %raw.name,
                        rule_index = index,
                        threshold = %r.time,
                        error = %error,
                        "Unparsable rule threshold, treating as 0s"
                    );
                }
                parsed.rule
            })
            .collect();

        Self {
            name: ResourceName::new(raw.name),
            external_name: raw.external_name,
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawConditionAfter;

    fn raw_resource(rules: Vec<(&str, &str, &str)>) -> RawResource {
        RawResource {
            name: "example".into(),
            external_name: None,
            condition_after: rules
                .into_iter()
                .map(|(time, t, s)| RawConditionAfter {
                    time: time.into(),
                    condition_type: t.into(),
                    condition_status: s.into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rules_keep_declaration_order() {
        let decl = ResourceDecl::from_raw(raw_resource(vec![
            ("10s", "Ready", "False"),
            ("5s", "Ready", "True"),
            ("5s", "Synced", "Unknown"),
        ]));

        assert_eq!(decl.rules.len(), 3);
        assert_eq!(decl.rules[0].threshold, Duration::from_secs(10));
        assert_eq!(decl.rules[1].status, ConditionStatus::True);
        assert_eq!(decl.rules[2].condition_type.as_str(), "Synced");
        assert_eq!(decl.rules[2].status, ConditionStatus::Unknown);
    }

    #[test]
    fn test_malformed_threshold_becomes_zero() {
        let decl = ResourceDecl::from_raw(raw_resource(vec![("later", "Ready", "True")]));

        assert_eq!(decl.rules[0].threshold, Duration::ZERO);
        assert_eq!(decl.rules[0].threshold_text, "later");
    }

    #[test]
    fn test_daemon_defaults() {
        let daemon = DaemonConfig::from_raw(RawDaemonConfig::default());
        assert_eq!(daemon.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(daemon.data_dir.to_string_lossy().contains("nopd"));

        let daemon = DaemonConfig::from_raw(RawDaemonConfig {
            poll_interval: Some("250ms".into()),
            data_dir: Some(PathBuf::from("/tmp/nop")),
        });
        assert_eq!(daemon.poll_interval, Duration::from_millis(250));
        assert_eq!(daemon.data_dir, PathBuf::from("/tmp/nop"));
    }
}
