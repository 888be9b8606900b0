//! Timed condition rules (desired state)

use nop_util::{parse_duration_text, DurationParseError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConditionStatus, ConditionType};

/// "After `threshold` has elapsed since creation, `condition_type` becomes `status`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    /// Age at which the rule becomes eligible
    pub threshold: Duration,
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    /// Threshold as declared, kept for diagnostics
    pub threshold_text: String,
}

/// Result of building a rule from its textual threshold.
///
/// An unparsable threshold never rejects the rule: it degrades to a zero
/// threshold, which makes the rule eligible immediately, and the parse error
/// is carried here so the caller decides whether to log or reject it.
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub rule: ConditionRule,
    pub threshold_error: Option<DurationParseError>,
}

impl ParsedRule {
    pub fn is_degraded(&self) -> bool {
        self.threshold_error.is_some()
    }
}

impl ConditionRule {
    pub fn new(
        threshold: Duration,
        condition_type: impl Into<ConditionType>,
        status: ConditionStatus,
    ) -> Self {
        Self {
            threshold,
            condition_type: condition_type.into(),
            status,
            threshold_text: nop_util::format_duration(threshold),
        }
    }

    /// Build a rule from a textual threshold such as `"10s"`
    pub fn parse(
        threshold_text: &str,
        condition_type: impl Into<ConditionType>,
        status: ConditionStatus,
    ) -> ParsedRule {
        let (threshold, threshold_error) = match parse_duration_text(threshold_text) {
            Ok(d) => (d, None),
            Err(e) => (Duration::ZERO, Some(e)),
        };

        ParsedRule {
            rule: ConditionRule {
                threshold,
                condition_type: condition_type.into(),
                status,
                threshold_text: threshold_text.to_string(),
            },
            threshold_error,
        }
    }

    /// Whether the rule applies to a resource of the given age
    pub fn is_eligible(&self, elapsed: Duration) -> bool {
        self.threshold <= elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_threshold() {
        let parsed = ConditionRule::parse("7s", "Ready", ConditionStatus::True);

        assert!(!parsed.is_degraded());
        assert_eq!(parsed.rule.threshold, Duration::from_secs(7));
        assert_eq!(parsed.rule.condition_type.as_str(), "Ready");
        assert_eq!(parsed.rule.threshold_text, "7s");
    }

    #[test]
    fn malformed_threshold_degrades_to_zero() {
        let parsed = ConditionRule::parse("soon", "Ready", ConditionStatus::True);

        assert!(parsed.is_degraded());
        assert_eq!(parsed.rule.threshold, Duration::ZERO);
        assert_eq!(parsed.rule.threshold_text, "soon");
        assert!(parsed.rule.is_eligible(Duration::ZERO));
    }

    #[test]
    fn negative_threshold_degrades_to_zero() {
        let parsed = ConditionRule::parse("-3s", "Synced", ConditionStatus::False);

        assert!(matches!(
            parsed.threshold_error,
            Some(DurationParseError::Negative(_))
        ));
        assert_eq!(parsed.rule.threshold, Duration::ZERO);
    }

    #[test]
    fn eligibility_boundary_is_inclusive() {
        let rule = ConditionRule::new(Duration::from_secs(2), "Ready", ConditionStatus::False);

        assert!(!rule.is_eligible(Duration::from_millis(1999)));
        assert!(rule.is_eligible(Duration::from_secs(2)));
        assert!(rule.is_eligible(Duration::from_secs(3)));
    }
}
