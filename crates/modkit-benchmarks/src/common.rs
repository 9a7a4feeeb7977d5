//! Common utilities for benchmarks

use criterion::Criterion;
use indexmap::IndexMap;
use modkit_core::{Dependency, DependencyRule, Descriptor, Version};
use modkit_resolver::DescriptorSource;
use pprof::criterion::{Output, PProfProfiler};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// In-memory descriptor source for benchmark setups
pub struct BenchSource {
    descriptors: IndexMap<String, Vec<Descriptor>>,
}

impl BenchSource {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        let mut map: IndexMap<String, Vec<Descriptor>> = IndexMap::new();
        for descriptor in descriptors {
            map.entry(descriptor.name.clone()).or_default().push(descriptor);
        }
        Self { descriptors: map }
    }
}

impl DescriptorSource for BenchSource {
    fn available_descriptors(&self, name: &str) -> Vec<Descriptor> {
        self.descriptors.get(name).cloned().unwrap_or_default()
    }

    fn describe(&self) -> String {
        "benchmark source".to_string()
    }
}

/// A linear chain: component-0 depends on component-1 and so on, each with
/// `versions_per_component` available versions.
pub fn chain_source(depth: usize, versions_per_component: usize) -> BenchSource {
    let mut descriptors = Vec::new();

    for i in 0..depth {
        for patch in 0..versions_per_component {
            let dependencies = if i + 1 < depth {
                vec![Dependency::new(
                    format!("component-{}", i + 1),
                    Version::new(1, 0, 0),
                    DependencyRule::NewerOrEqual,
                )]
            } else {
                Vec::new()
            };

            descriptors.push(Descriptor::new(
                format!("component-{i}"),
                Version::new(1, 0, patch as u64),
                dependencies,
            ));
        }
    }

    BenchSource::new(descriptors)
}

/// Root requirement pulling in the whole chain
pub fn chain_requirements() -> Vec<Dependency> {
    vec![Dependency::new(
        "component-0",
        Version::new(1, 0, 0),
        DependencyRule::NewerOrEqual,
    )]
}
