//! Strongly-typed identifiers for nop-provider

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of a managed resource, unique within a provider instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier assigned to a resource when it is first created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceUid(Uuid);

impl ResourceUid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_equality() {
        let a = ResourceName::new("example");
        let b = ResourceName::from("example");
        let c = ResourceName::new("other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn resource_uid_uniqueness() {
        assert_ne!(ResourceUid::new(), ResourceUid::new());
    }

    #[test]
    fn ids_serialize_as_plain_values() {
        let name = ResourceName::new("example");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"example\"");

        let uid = ResourceUid::new();
        let json = serde_json::to_string(&uid).unwrap();
        let parsed: ResourceUid = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, parsed);
    }
}
