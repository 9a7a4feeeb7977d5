//! Descriptor records.
//!
//! A descriptor describes one available version of a component: its name,
//! its version, and the dependency constraints that version carries. A
//! provider produces descriptors once; they are never mutated.

use super::{Dependency, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Immutable description of one available component version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
}

impl Descriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, version: Version, dependencies: Vec<Dependency>) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies,
        }
    }
}

// Descriptor identity is (name, version); the dependency list is derived
// data supplied by the same provider.
impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencyRule;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_identity_is_name_and_version() {
        let a = Descriptor::new("base", v("1.0.0"), vec![]);
        let b = Descriptor::new(
            "base",
            v("1.0.0"),
            vec![Dependency::new("lib", v("0.1.0"), DependencyRule::Exactly)],
        );
        let c = Descriptor::new("base", v("1.0.1"), vec![]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let d = Descriptor::new("base", v("2.1.0"), vec![]);
        assert_eq!(d.to_string(), "base@2.1.0");
    }

    #[test]
    fn test_fixture_round_trip() {
        let json = r#"{
            "name": "parent",
            "version": "1.0.0",
            "dependencies": [
                { "component": "base", "version": "1.0.0", "rule": "Compatible" }
            ]
        }"#;

        let d: Descriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.name, "parent");
        assert_eq!(d.dependencies.len(), 1);
        assert!(d.dependencies[0].is_met_by(&v("1.2.0")));
    }
}
