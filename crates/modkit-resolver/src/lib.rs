//! Dependency resolution engine for the modkit component loader
//!
//! This crate resolves a set of versioned, inter-dependent components into
//! one mutually-consistent, version-maximal assignment. Constraints
//! propagate along the edges of a lazily-built dependency graph; when a
//! node's constraint set cannot be met, the most restrictive incoming edge
//! is relaxed by forcing its source onto a strictly earlier version.

pub mod graph;
pub mod selector;

// Re-export main types
pub use graph::{DependencyGraph, EdgeSource};
pub use selector::VersionSelector;

use modkit_core::Descriptor;

/// Source of component descriptors consumed by the resolver.
///
/// The resolver only ever reads from a source; constructing a component
/// once a version is chosen is a separate concern layered on top.
pub trait DescriptorSource {
    /// All known descriptors for a component, in any order.
    fn available_descriptors(&self, name: &str) -> Vec<Descriptor>;

    /// Human-readable description used in resolution failure reports.
    fn describe(&self) -> String {
        "descriptor source".to_string()
    }
}
