//! Semantic version type with dependency-oriented comparisons.
//!
//! Provides the Version type used everywhere a component version appears,
//! with the three comparisons the resolver is built on: precedence ordering,
//! dependency-identity matching, and asymmetric compatibility.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Semantic version (major.minor.patch-prerelease+build)
///
/// Build metadata never affects ordering, matching, or compatibility; it is
/// carried only so that a version string round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version parsing and validation errors
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },

    #[error("Invalid prerelease identifier: {prerelease}")]
    InvalidPrerelease { prerelease: String },

    #[error("Invalid build metadata: {build}")]
    InvalidBuild { build: String },
}

impl Version {
    /// Create a new version with no prerelease or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Attach a prerelease identifier list (dot-separated)
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    /// Attach build metadata
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Strict precedence comparison: true if `self` is a newer version than `other`
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.precedence_cmp(other) == Ordering::Greater
    }

    /// Identity for dependency purposes: same numeric triple and the same
    /// prerelease identifiers. Build metadata is ignored.
    pub fn matches(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.prerelease == other.prerelease
    }

    /// Asymmetric compatibility: true if `self` is usable where `required`
    /// was expected.
    ///
    /// Prerelease versions and the 0.x range make no stability promises, so
    /// compatibility degrades to [`matches`](Self::matches) there. Otherwise
    /// the majors must agree and `self` must carry at least the minor API
    /// surface of `required`.
    pub fn is_compatible_with(&self, required: &Self) -> bool {
        if self.prerelease.is_some()
            || required.prerelease.is_some()
            || self.major == 0
            || required.major == 0
        {
            return self.matches(required);
        }

        self.major == required.major && self.minor >= required.minor
    }

    /// Precedence order per semantic versioning; build metadata excluded
    fn precedence_cmp(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            },
            ord => ord,
        }
    }
}

/// Identifier-by-identifier prerelease comparison.
///
/// Numeric identifiers compare numerically and rank below alphanumeric ones;
/// when all shared identifiers tie, the longer list takes precedence.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    for (lhs, rhs) in a.split('.').zip(b.split('.')) {
        let ord = match (lhs.parse::<u64>(), rhs.parse::<u64>()) {
            (Ok(m), Ok(n)) => m.cmp(&n),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => lhs.cmp(rhs),
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.split('.').count().cmp(&b.split('.').count())
}

fn valid_metadata_chars(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        // Split on '+' for build metadata
        let (version_part, build) = match input.split_once('+') {
            Some((v, b)) => (v, Some(b.to_string())),
            None => (input, None),
        };

        if let Some(ref b) = build {
            if !valid_metadata_chars(b) {
                return Err(VersionError::InvalidBuild { build: b.clone() });
            }
        }

        // Split on the first '-' for the prerelease; later dashes belong to
        // the identifiers themselves.
        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => (c, Some(p.to_string())),
            None => (version_part, None),
        };

        if let Some(ref p) = prerelease {
            if !valid_metadata_chars(p) {
                return Err(VersionError::InvalidPrerelease {
                    prerelease: p.clone(),
                });
            }
        }

        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }

        let major = parts[0].parse().map_err(|_| VersionError::InvalidNumber {
            component: parts[0].to_string(),
        })?;
        let minor = parts[1].parse().map_err(|_| VersionError::InvalidNumber {
            component: parts[1].to_string(),
        })?;
        let patch = parts[2].parse().map_err(|_| VersionError::InvalidNumber {
            component: parts[2].to_string(),
        })?;

        Ok(Version {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
    }
}

// Versions serialize as their canonical string form so that descriptor
// fixtures stay readable.
impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::from_str(&s).map_err(DeError::custom)
    }
}
