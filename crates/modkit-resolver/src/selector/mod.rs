//! Driver loop turning external requirements into a full version assignment.
//!
//! The selector repeatedly picks any required node without a choice and runs
//! the per-node choice algorithm on it until every required node holds one.
//! The order among pending nodes does not affect the result: a node's choice
//! is only ever constrained by registered edges, never assumed.

use indexmap::IndexMap;
use modkit_core::{Dependency, Descriptor, LoadError, LoadResult};
use tracing::info;

use crate::graph::{Budget, DependencyGraph, EdgeSource, SelectFailure};
use crate::DescriptorSource;

/// Ceiling on per-node choice steps for one resolution run. Cascading
/// relaxations have no termination bound by construction; tripping this is
/// reported as an error rather than looping forever.
const SELECTION_STEP_LIMIT: usize = 65_536;

/// Solves the version requirements for a group of components
pub struct VersionSelector<'a> {
    graph: DependencyGraph<'a>,
    requirements: Vec<Dependency>,
    provider: String,
}

impl<'a> VersionSelector<'a> {
    /// Create a selector over `source` seeded with the external requirements
    pub fn new(source: &'a dyn DescriptorSource, requirements: Vec<Dependency>) -> Self {
        let mut graph = DependencyGraph::new(source);

        let mut grouped: IndexMap<String, Vec<Dependency>> = IndexMap::new();
        for requirement in &requirements {
            grouped
                .entry(requirement.component.clone())
                .or_default()
                .push(requirement.clone());
        }

        for (name, constraints) in grouped {
            graph.ensure_node(&name);
            graph.set_incoming(&name, EdgeSource::External, constraints);
        }

        Self {
            graph,
            requirements,
            provider: source.describe(),
        }
    }

    /// Resolve a consistent, version-maximal assignment for every component
    /// transitively required by the external requirement set.
    pub fn select_versions(mut self) -> LoadResult<IndexMap<String, Descriptor>> {
        let mut budget = Budget::new(SELECTION_STEP_LIMIT);

        while let Some(name) = self.graph.next_unresolved() {
            match self.graph.choose_version(&name, &mut budget) {
                Ok(()) => {}
                Err(SelectFailure::External) => {
                    return Err(LoadError::GraphUnsatisfiable {
                        requirements: self.requirements,
                        provider: self.provider,
                    });
                }
                Err(SelectFailure::Budget(attempts)) => {
                    return Err(LoadError::ResolutionBudgetExhausted { attempts });
                }
            }
        }

        let selections = self.graph.selections();
        info!(components = selections.len(), "resolved component versions");

        Ok(selections)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use modkit_core::{DependencyRule, Version};
    use proptest::prelude::*;

    struct MapSource {
        descriptors: IndexMap<String, Vec<Descriptor>>,
    }

    impl DescriptorSource for MapSource {
        fn available_descriptors(&self, name: &str) -> Vec<Descriptor> {
            self.descriptors.get(name).cloned().unwrap_or_default()
        }
    }

    fn map_source(descriptors: Vec<Descriptor>) -> MapSource {
        let mut map: IndexMap<String, Vec<Descriptor>> = IndexMap::new();
        for d in descriptors {
            map.entry(d.name.clone()).or_default().push(d);
        }
        MapSource { descriptors: map }
    }

    proptest! {
        // Whatever satisfying versions exist, the selector picks the highest.
        #[test]
        fn selection_is_maximal(
            patches in prop::collection::btree_set(0u64..50, 1..10),
            floor in 0u64..50,
        ) {
            let versions: Vec<Version> = patches.iter().map(|p| Version::new(1, 0, *p)).collect();
            let descriptors = versions
                .iter()
                .map(|ver| Descriptor::new("base", ver.clone(), vec![]))
                .collect();
            let src = map_source(descriptors);

            let requirement = Dependency::new("base", Version::new(1, 0, floor), DependencyRule::NewerOrEqual);
            let result = VersionSelector::new(&src, vec![requirement.clone()]).select_versions();

            let expected = versions
                .iter()
                .filter(|ver| requirement.is_met_by(ver))
                .max()
                .cloned();

            match expected {
                Some(best) => prop_assert_eq!(result.unwrap()["base"].version.clone(), best),
                None => prop_assert!(
                    matches!(result, Err(LoadError::GraphUnsatisfiable { .. })),
                    "expected GraphUnsatisfiable error"
                ),
            }
        }
    }
}
