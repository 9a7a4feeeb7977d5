//! Dependency constraint types.
//!
//! A dependency names a target component, a reference version, and the rule
//! relating a candidate version to the reference.

use super::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship a candidate version must have to the reference version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DependencyRule {
    /// Requires one particular version, ignoring build metadata
    Exactly,
    Newer,
    NewerOrEqual,
    Older,
    OlderOrEqual,
    /// Excludes one particular version, ignoring build metadata
    Exclude,
    /// Requires a version usable where the reference version was expected.
    /// Prerelease versions are never compatible unless they match exactly.
    #[default]
    Compatible,
}

/// Rule-qualified version requirement one component places on another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub component: String,
    pub version: Version,
    pub rule: DependencyRule,
}

impl DependencyRule {
    /// Evaluate this rule for a candidate version against the reference
    pub fn permits(&self, required: &Version, candidate: &Version) -> bool {
        match self {
            DependencyRule::Exactly => candidate.matches(required),
            DependencyRule::Newer => candidate.is_newer_than(required),
            DependencyRule::NewerOrEqual => {
                candidate.is_newer_than(required) || candidate.matches(required)
            }
            DependencyRule::Older => required.is_newer_than(candidate),
            DependencyRule::OlderOrEqual => {
                required.is_newer_than(candidate) || candidate.matches(required)
            }
            DependencyRule::Exclude => !candidate.matches(required),
            DependencyRule::Compatible => candidate.is_compatible_with(required),
        }
    }
}

impl fmt::Display for DependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyRule::Exactly => "exactly",
            DependencyRule::Newer => "newer",
            DependencyRule::NewerOrEqual => "newer-or-equal",
            DependencyRule::Older => "older",
            DependencyRule::OlderOrEqual => "older-or-equal",
            DependencyRule::Exclude => "exclude",
            DependencyRule::Compatible => "compatible",
        };
        f.write_str(name)
    }
}

impl Dependency {
    /// Create a new dependency constraint
    pub fn new(component: impl Into<String>, version: Version, rule: DependencyRule) -> Self {
        Self {
            component: component.into(),
            version,
            rule,
        }
    }

    /// Create a constraint with the default `Compatible` rule
    pub fn compatible(component: impl Into<String>, version: Version) -> Self {
        Self::new(component, version, DependencyRule::Compatible)
    }

    /// Check whether a candidate version meets this constraint
    pub fn is_met_by(&self, candidate: &Version) -> bool {
        self.rule.permits(&self.version, candidate)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}@{}", self.rule, self.component, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_exactly_ignores_build() {
        let dep = Dependency::new("base", v("1.0.0+b1"), DependencyRule::Exactly);

        assert!(dep.is_met_by(&v("1.0.0")));
        assert!(dep.is_met_by(&v("1.0.0+b2")));
        assert!(!dep.is_met_by(&v("1.0.1")));
    }

    #[test]
    fn test_newer_rules() {
        let newer = Dependency::new("base", v("1.0.0"), DependencyRule::Newer);
        assert!(newer.is_met_by(&v("1.0.1")));
        assert!(!newer.is_met_by(&v("1.0.0")));

        let newer_or_equal = Dependency::new("base", v("1.0.0"), DependencyRule::NewerOrEqual);
        assert!(newer_or_equal.is_met_by(&v("1.0.0")));
        assert!(newer_or_equal.is_met_by(&v("2.0.0")));
        assert!(!newer_or_equal.is_met_by(&v("0.9.9")));
    }

    #[test]
    fn test_older_rules() {
        let older = Dependency::new("base", v("1.0.0"), DependencyRule::Older);
        assert!(older.is_met_by(&v("0.9.9")));
        assert!(!older.is_met_by(&v("1.0.0")));

        let older_or_equal = Dependency::new("base", v("1.0.0"), DependencyRule::OlderOrEqual);
        assert!(older_or_equal.is_met_by(&v("1.0.0")));
        assert!(!older_or_equal.is_met_by(&v("1.0.1")));
    }

    #[test]
    fn test_exclude() {
        let dep = Dependency::new("base", v("1.0.0"), DependencyRule::Exclude);
        assert!(!dep.is_met_by(&v("1.0.0")));
        assert!(dep.is_met_by(&v("1.0.1")));
    }

    #[test]
    fn test_compatible_is_default() {
        assert_eq!(DependencyRule::default(), DependencyRule::Compatible);

        let dep = Dependency::compatible("base", v("1.0.5"));
        assert!(dep.is_met_by(&v("1.1.0")));
        assert!(!dep.is_met_by(&v("1.0.0")));
        assert!(!dep.is_met_by(&v("2.0.5")));
    }

    #[test]
    fn test_display() {
        let dep = Dependency::new("base", v("1.2.0"), DependencyRule::NewerOrEqual);
        assert_eq!(dep.to_string(), "newer-or-equal base@1.2.0");
    }

    #[test]
    fn test_serde_fixture_form() {
        let dep: Dependency = serde_json::from_str(
            r#"{ "component": "base", "version": "1.0.0", "rule": "NewerOrEqual" }"#,
        )
        .unwrap();

        assert_eq!(
            dep,
            Dependency::new("base", v("1.0.0"), DependencyRule::NewerOrEqual)
        );
    }
}
