//! # modkit-core
//!
//! Core types and utilities shared across all modkit crates.
//!
//! This crate provides:
//! - Version with semantic ordering, matching, and compatibility checks
//! - Dependency and DependencyRule for rule-qualified version requirements
//! - Descriptor records describing one available component version
//! - StageName and StageKey identifiers for loading stages
//! - LoadError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Descriptor, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{BoxError, LoadError, LoadResult};
pub use types::{Dependency, DependencyRule, Descriptor, StageKey, StageName, Version};
