//! Dependency graph with per-node version choice and relaxation.
//!
//! The graph is a single owned arena keyed by component name; nodes refer
//! to each other by name only. Each node tracks its available descriptors
//! in descending version order, the constraints every source places on it,
//! and a search cursor that never re-examines versions already proven
//! unusable for the current constraint set.

use indexmap::{IndexMap, IndexSet};
use modkit_core::{Dependency, Descriptor};
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::DescriptorSource;

/// Where an incoming constraint originates: the external requirement set or
/// another component's chosen descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeSource {
    External,
    Component(String),
}

/// One source's constraints on a node, reduced to the subset of the node's
/// descriptors those constraints allow.
#[derive(Debug)]
struct Edge {
    /// Indices into the node's descending descriptor list
    allowed: BTreeSet<usize>,
}

#[derive(Debug)]
struct Node {
    /// Available descriptors, newest first
    descriptors: Vec<Descriptor>,
    incoming: IndexMap<EdgeSource, Edge>,
    /// Components currently holding an edge registered by this node
    outgoing: IndexSet<String>,
    /// Index of the chosen descriptor, if any
    chosen: Option<usize>,
    /// No descriptor before this index satisfies the current constraint set
    cursor: usize,
}

/// Why a per-node choice could not be completed
pub(crate) enum SelectFailure {
    /// An external requirement would have to be relaxed
    External,
    /// The step ceiling tripped before the choice converged
    Budget(usize),
}

/// Step ceiling shared by one resolution run. Cascading relaxations are not
/// bounded by construction, so a runaway chain surfaces as an error instead
/// of looping.
pub(crate) struct Budget {
    steps: usize,
    limit: usize,
}

impl Budget {
    pub(crate) fn new(limit: usize) -> Self {
        Self { steps: 0, limit }
    }

    fn step(&mut self) -> Result<(), SelectFailure> {
        self.steps += 1;
        if self.steps > self.limit {
            Err(SelectFailure::Budget(self.steps))
        } else {
            Ok(())
        }
    }
}

/// A pending per-node choice on the relaxation work stack. The outgoing
/// targets at entry are remembered so that targets dropped by a lower
/// version choice get their search restarted.
struct Frame {
    name: String,
    prior_outgoing: Vec<String>,
}

/// Arena of dependency nodes for one resolution run
pub struct DependencyGraph<'a> {
    source: &'a dyn DescriptorSource,
    nodes: IndexMap<String, Node>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(source: &'a dyn DescriptorSource) -> Self {
        Self {
            source,
            nodes: IndexMap::new(),
        }
    }

    /// Number of nodes referenced so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create the node for `name` on first reference
    pub(crate) fn ensure_node(&mut self, name: &str) {
        if self.nodes.contains_key(name) {
            return;
        }

        let mut descriptors = self.source.available_descriptors(name);
        descriptors.sort_by(|a, b| b.version.cmp(&a.version));

        debug!(
            component = name,
            versions = descriptors.len(),
            "registered dependency node"
        );

        self.nodes.insert(
            name.to_string(),
            Node {
                descriptors,
                incoming: IndexMap::new(),
                outgoing: IndexSet::new(),
                chosen: None,
                cursor: 0,
            },
        );
    }

    /// First node that is required but has no choice yet, in registration
    /// order. Registration order must not affect the outcome; it only picks
    /// which of several pending nodes is handled next.
    pub(crate) fn next_unresolved(&self) -> Option<String> {
        self.nodes
            .iter()
            .find(|(_, node)| !node.incoming.is_empty() && node.chosen.is_none())
            .map(|(name, _)| name.clone())
    }

    /// Final assignment: every required node's chosen descriptor
    pub(crate) fn selections(&self) -> IndexMap<String, Descriptor> {
        self.nodes
            .iter()
            .filter(|(_, node)| !node.incoming.is_empty())
            .filter_map(|(name, node)| {
                node.chosen
                    .map(|i| (name.clone(), node.descriptors[i].clone()))
            })
            .collect()
    }

    fn is_required(&self, name: &str) -> bool {
        !self.nodes[name].incoming.is_empty()
    }

    /// Register (or replace) the constraints one source places on `target`
    pub(crate) fn set_incoming(
        &mut self,
        target: &str,
        source: EdgeSource,
        constraints: Vec<Dependency>,
    ) {
        let allowed = {
            let node = &self.nodes[target];
            allowed_set(&node.descriptors, &constraints)
        };

        if let EdgeSource::Component(source_name) = &source {
            self.nodes[source_name.as_str()]
                .outgoing
                .insert(target.to_string());
        }

        let node = &mut self.nodes[target];
        let invalidated = node.chosen.is_some_and(|i| !allowed.contains(&i));
        node.incoming.insert(source, Edge { allowed });

        if invalidated {
            self.clear_choice(target);
        }

        self.revalidate_cursor(target);
    }

    /// Remove the edge `source_name` registered on `target`
    fn remove_incoming(&mut self, target: &str, source_name: &str) {
        if let Some(node) = self.nodes.get_mut(target) {
            node.incoming
                .shift_remove(&EdgeSource::Component(source_name.to_string()));
        }
        if let Some(source) = self.nodes.get_mut(source_name) {
            source.outgoing.shift_remove(target);
        }

        self.revalidate_cursor(target);
    }

    /// Walk the skipped prefix again if a constraint change re-admitted a
    /// version there; the cursor only skips versions proven unusable for the
    /// *current* incoming set.
    fn revalidate_cursor(&mut self, name: &str) {
        let node = &self.nodes[name];
        let readmitted = (0..node.cursor)
            .any(|i| node.incoming.values().all(|edge| edge.allowed.contains(&i)));

        if readmitted {
            trace!(component = name, "constraint change re-admitted a skipped version");
            self.nodes[name].cursor = 0;
        }
    }

    /// Drop the node's choice and every edge it registered. Cursors of the
    /// former targets are not force-reset here; the removal may be temporary
    /// while a relaxation is in flight.
    fn clear_choice(&mut self, name: &str) {
        if self.nodes[name].chosen.is_none() {
            return;
        }

        let targets: Vec<String> = self.nodes[name].outgoing.iter().cloned().collect();
        for target in &targets {
            self.remove_incoming(target, name);
        }

        self.nodes[name].chosen = None;
    }

    /// First descriptor from the cursor onward allowed by every incoming edge
    fn find_candidate(&self, name: &str) -> Option<usize> {
        let node = &self.nodes[name];
        (node.cursor..node.descriptors.len())
            .find(|i| node.incoming.values().all(|edge| edge.allowed.contains(i)))
    }

    /// Record a choice and rewire the node's outgoing edges to match the
    /// chosen descriptor's dependency list.
    fn set_choice(&mut self, name: &str, index: usize, prior_outgoing: &[String]) {
        {
            let node = &mut self.nodes[name];
            node.cursor = index + 1;
            node.chosen = Some(index);
        }

        debug!(
            component = name,
            version = %self.nodes[name].descriptors[index].version,
            "chose version"
        );

        let mut groups: IndexMap<String, Vec<Dependency>> = IndexMap::new();
        for dependency in self.nodes[name].descriptors[index].dependencies.clone() {
            groups
                .entry(dependency.component.clone())
                .or_default()
                .push(dependency);
        }

        // Targets no longer depended on lose their edge and restart their
        // search: a removed constraint may re-admit versions previously
        // rejected.
        let mut stale: IndexSet<String> = prior_outgoing.iter().cloned().collect();
        stale.extend(self.nodes[name].outgoing.iter().cloned());
        for target in stale {
            if !groups.contains_key(&target) {
                self.remove_incoming(&target, name);
                if let Some(node) = self.nodes.get_mut(&target) {
                    node.cursor = 0;
                }
            }
        }

        for (target, dependencies) in groups {
            self.ensure_node(&target);
            self.set_incoming(&target, EdgeSource::Component(name.to_string()), dependencies);
        }
    }

    /// The edge that must be relaxed before a choice can succeed: the one
    /// whose allowed-set's oldest member is the newest among all edges, since
    /// that source imposes the highest lower bound. A source no version can
    /// satisfy is relaxed unconditionally.
    fn relax_target(&self, name: &str) -> EdgeSource {
        let node = &self.nodes[name];
        let mut best: Option<(&EdgeSource, usize)> = None;

        for (source, edge) in &node.incoming {
            let Some(&oldest) = edge.allowed.iter().next_back() else {
                return source.clone();
            };

            let lower_bound = &node.descriptors[oldest].version;
            let newer = match best {
                Some((_, bound)) => lower_bound.is_newer_than(&node.descriptors[bound].version),
                None => true,
            };

            if newer {
                best = Some((source, oldest));
            }
        }

        best.map_or(EdgeSource::External, |(source, _)| source.clone())
    }

    /// Attempt to pick a version for `name`, relaxing the sources of
    /// over-restrictive edges as needed.
    ///
    /// Driven by an explicit work stack: a frame that cannot choose pushes
    /// the source it needs relaxed and is retried once that source holds a
    /// strictly earlier version (its cursor has already advanced past the
    /// rejected choice). A frame whose node is no longer required — a
    /// relaxation upstream removed the dependency — is dropped unchosen.
    pub(crate) fn choose_version(
        &mut self,
        name: &str,
        budget: &mut Budget,
    ) -> Result<(), SelectFailure> {
        let mut stack = vec![self.frame_for(name)];

        while let Some(top) = stack.last() {
            budget.step()?;
            let current = top.name.clone();

            if !self.is_required(&current) {
                stack.pop();
                continue;
            }

            match self.find_candidate(&current) {
                Some(index) => {
                    if let Some(frame) = stack.pop() {
                        self.set_choice(&current, index, &frame.prior_outgoing);
                    }
                }
                None => {
                    self.clear_choice(&current);

                    match self.relax_target(&current) {
                        EdgeSource::External => return Err(SelectFailure::External),
                        EdgeSource::Component(source) => {
                            trace!(component = %current, relaxing = %source, "relaxing most restrictive edge");
                            stack.push(self.frame_for(&source));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn frame_for(&self, name: &str) -> Frame {
        Frame {
            name: name.to_string(),
            prior_outgoing: self.nodes[name].outgoing.iter().cloned().collect(),
        }
    }
}

/// Indices of the descriptors every constraint in the list permits
fn allowed_set(descriptors: &[Descriptor], constraints: &[Dependency]) -> BTreeSet<usize> {
    descriptors
        .iter()
        .enumerate()
        .filter(|(_, descriptor)| {
            constraints
                .iter()
                .all(|constraint| constraint.is_met_by(&descriptor.version))
        })
        .map(|(i, _)| i)
        .collect()
}
