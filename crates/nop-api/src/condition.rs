//! Resource conditions (observed state)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a condition status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid condition status '{0}' (expected True, False or Unknown)")]
pub struct InvalidConditionStatus(pub String);

impl FromStr for ConditionStatus {
    type Err = InvalidConditionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "True" => Ok(ConditionStatus::True),
            "False" => Ok(ConditionStatus::False),
            "Unknown" => Ok(ConditionStatus::Unknown),
            other => Err(InvalidConditionStatus(other.to_string())),
        }
    }
}

/// Condition type, an open set of health axes such as `Ready` or `Synced`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionType(String);

impl ConditionType {
    pub const READY: &'static str = "Ready";
    pub const SYNCED: &'static str = "Synced";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn ready() -> Self {
        Self::new(Self::READY)
    }

    pub fn synced() -> Self {
        Self::new(Self::SYNCED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConditionType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConditionType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Machine-readable reason attached to a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionReason {
    /// Set by a timed rule
    Available,
    /// Terminal marker while the resource is being deleted
    Deleting,
    /// The external resource is being created
    Creating,
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionReason::Available => "Available",
            ConditionReason::Deleting => "Deleting",
            ConditionReason::Creating => "Creating",
        };
        f.write_str(s)
    }
}

/// A single observed condition record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    pub last_transition_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// Condition produced by a timed rule
    pub fn available(
        condition_type: ConditionType,
        status: ConditionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason: ConditionReason::Available,
            last_transition_time: now,
            message: None,
        }
    }

    /// Terminal condition set while a resource is being deleted
    pub fn deleting(now: DateTime<Utc>) -> Self {
        Self {
            condition_type: ConditionType::ready(),
            status: ConditionStatus::False,
            reason: ConditionReason::Deleting,
            last_transition_time: now,
            message: None,
        }
    }

    /// Condition set while the external resource is being created
    pub fn creating(now: DateTime<Utc>) -> Self {
        Self {
            condition_type: ConditionType::ready(),
            status: ConditionStatus::False,
            reason: ConditionReason::Creating,
            last_transition_time: now,
            message: None,
        }
    }

    /// True when both conditions agree on everything but the transition time
    pub fn same_state(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Conditions of a resource, at most one per condition type.
///
/// Iteration follows the order in which types were first set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a condition, replacing any existing record of the same type
    pub fn set(&mut self, condition: Condition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => *existing = condition,
            None => self.0.push(condition),
        }
    }

    pub fn get(&self, condition_type: &ConditionType) -> Option<&Condition> {
        self.0.iter().find(|c| &c.condition_type == condition_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(type, status)` pairs, used for compact logging and event payloads
    pub fn summary(&self) -> Vec<(ConditionType, ConditionStatus)> {
        self.0
            .iter()
            .map(|c| (c.condition_type.clone(), c.status))
            .collect()
    }

    /// True when both sets hold the same conditions, ignoring transition times
    pub fn same_state(&self, other: &ConditionSet) -> bool {
        self.len() == other.len()
            && self.iter().all(|c| {
                other
                    .get(&c.condition_type)
                    .is_some_and(|o| o.same_state(c))
            })
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut set = ConditionSet::new();
        for condition in iter {
            set.set(condition);
        }
        set
    }
}
