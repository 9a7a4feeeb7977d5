//! # modkit-loader
//!
//! Thin orchestrator tying the resolver and the stage graph together. A
//! loader is handed a provider, resolves one consistent version assignment
//! for a set of requirements, constructs every resolved component in
//! dependency order, and executes the combined loading-stage graph.
//!
//! The loader never touches how a component's code is isolated or
//! instantiated; that is entirely the provider's concern, reached through
//! one opaque `construct` call.

use indexmap::{IndexMap, IndexSet};
use modkit_core::{BoxError, Dependency, Descriptor, LoadError, LoadResult, StageName};
use modkit_resolver::{DescriptorSource, VersionSelector};
use modkit_stage::{StageGraph, StageRequest};
use tracing::info;

/// Opaque handle to a constructed component
pub type ComponentHandle = Box<dyn Component>;

/// Components constructed so far, keyed by name in dependency order
pub type ResolvedComponents = IndexMap<String, ComponentHandle>;

/// A constructed component taking part in the loading process
pub trait Component {
    /// The descriptor this component was constructed from
    fn descriptor(&self) -> &Descriptor;

    /// Declare the loading stages this component needs. Called once per load
    /// attempt, after every component has been constructed.
    fn configure_loading_process(&mut self) -> Vec<StageRequest>;
}

/// Supplies descriptors and constructs components once versions are chosen.
///
/// Construction failures pass through to the caller unmodified as
/// [`LoadError::Construction`].
pub trait ComponentProvider: DescriptorSource {
    fn construct(
        &self,
        descriptor: &Descriptor,
        resolved: &ResolvedComponents,
    ) -> Result<ComponentHandle, BoxError>;
}

/// Loads a network of components from a provider
pub struct Loader<P> {
    provider: P,
    components: ResolvedComponents,
}

impl<P: ComponentProvider> Loader<P> {
    /// Create a loader over the given provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            components: ResolvedComponents::new(),
        }
    }

    /// Resolve, construct, and initialize every component needed to satisfy
    /// the requirements.
    ///
    /// On failure nothing is kept: components from the failed attempt are
    /// dropped and the stage set is discarded. A successful load replaces
    /// any previously loaded set.
    pub fn load(&mut self, requirements: Vec<Dependency>) -> LoadResult<()> {
        let selected = VersionSelector::new(&self.provider, requirements).select_versions()?;

        let mut components = ResolvedComponents::new();
        for name in selected.keys() {
            let mut visiting = IndexSet::new();
            self.construct_with_dependencies(name, &selected, &mut components, &mut visiting)?;
        }

        let requests = collect_stage_requests(&mut components);
        StageGraph::build(requests)?.execute()?;

        info!(components = components.len(), "loaded component set");
        self.components = components;

        Ok(())
    }

    /// An already-loaded component, by name
    pub fn lookup(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|handle| handle.as_ref())
    }

    /// Construct `name` after its dependencies, so that every handle a
    /// component can see at construction time is already built. A name
    /// already being visited on this path (a dependency cycle) is skipped
    /// and constructed by its own top-level turn.
    fn construct_with_dependencies(
        &self,
        name: &str,
        selected: &IndexMap<String, Descriptor>,
        components: &mut ResolvedComponents,
        visiting: &mut IndexSet<String>,
    ) -> LoadResult<()> {
        if components.contains_key(name) || !visiting.insert(name.to_string()) {
            return Ok(());
        }

        let descriptor = &selected[name];
        for dependency in &descriptor.dependencies {
            self.construct_with_dependencies(&dependency.component, selected, components, visiting)?;
        }

        let handle = self
            .provider
            .construct(descriptor, components)
            .map_err(|source| LoadError::Construction {
                component: name.to_string(),
                source,
            })?;

        components.insert(name.to_string(), handle);
        Ok(())
    }
}

/// Gather every component's declared stages, bracketed by that component's
/// implicit Start and End stages: declared stages run after their own Start
/// and before their own End.
fn collect_stage_requests(components: &mut ResolvedComponents) -> Vec<StageRequest> {
    let mut requests = Vec::new();

    for (name, component) in components.iter_mut() {
        let start = {
            let component = name.clone();
            StageRequest::new(name.clone(), StageName::Start, move || {
                info!(component = %component, "component started loading");
                Ok(())
            })
        };
        let end = {
            let component = name.clone();
            StageRequest::new(name.clone(), StageName::End, move || {
                info!(component = %component, "component finished loading");
                Ok(())
            })
        };

        for declared in component.configure_loading_process() {
            requests.push(declared.after_request(&start).before_request(&end));
        }

        requests.push(start);
        requests.push(end);
    }

    requests
}
