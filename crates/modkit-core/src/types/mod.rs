//! Core data types for component resolution and stage ordering.

pub mod dependency;
pub mod descriptor;
pub mod stage;
pub mod version;

pub use dependency::{Dependency, DependencyRule};
pub use descriptor::Descriptor;
pub use stage::{StageKey, StageName};
pub use version::{Version, VersionError};
