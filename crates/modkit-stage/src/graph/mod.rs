//! Stage precedence graph construction and execution.
//!
//! For every ordered pair of stages, one precedence edge is added per
//! matching before-filter of the earlier stage and per matching after-filter
//! of the later one. Each edge raises the later stage's pending-predecessor
//! counter; completion notifications walk the same edges back down, so both
//! directions cost O(1) per edge.

use indexmap::IndexSet;
use modkit_core::{LoadError, LoadResult, StageKey};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::{debug, info};

use crate::request::{StageAction, StageRequest};

struct StageNode {
    key: StageKey,
    action: Option<StageAction>,
    /// Predecessors still to complete before this stage may run
    pending: usize,
}

/// Precedence DAG over the stages of one load attempt
pub struct StageGraph {
    graph: DiGraph<StageNode, ()>,
}

impl std::fmt::Debug for StageGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

impl StageGraph {
    /// Derive the precedence relation for the full stage set of one load
    /// attempt. Stage identity is the (component, name) pair; duplicates are
    /// rejected. Filters are never evaluated against their own stage.
    pub fn build(mut requests: Vec<StageRequest>) -> LoadResult<Self> {
        let mut seen = IndexSet::new();
        for request in &requests {
            if !seen.insert(request.key().clone()) {
                let key = request.key().clone();
                return Err(LoadError::DuplicateStage {
                    component: key.component,
                    stage: key.name,
                });
            }
        }

        let mut graph = DiGraph::new();
        let indices: Vec<NodeIndex> = requests
            .iter_mut()
            .map(|request| {
                graph.add_node(StageNode {
                    key: request.key().clone(),
                    action: request.take_action(),
                    pending: 0,
                })
            })
            .collect();

        for (i, earlier) in requests.iter().enumerate() {
            for (j, later) in requests.iter().enumerate() {
                if i == j {
                    continue;
                }

                if earlier.runs_before(later.key()) {
                    graph.add_edge(indices[i], indices[j], ());
                    graph[indices[j]].pending += 1;
                }

                if later.runs_after(earlier.key()) {
                    graph.add_edge(indices[i], indices[j], ());
                    graph[indices[j]].pending += 1;
                }
            }
        }

        debug!(
            stages = graph.node_count(),
            edges = graph.edge_count(),
            "derived stage precedence graph"
        );

        Ok(Self { graph })
    }

    /// Number of stages in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Execute every stage as a depth-first cascade from the root set.
    ///
    /// A stage runs once all its predecessors completed; completing it wakes
    /// its dependents in declaration order, depth-first. A failing action
    /// aborts the whole run immediately. After a fully successful traversal,
    /// stages whose counter never reached zero are reported as deadlocked.
    pub fn execute(mut self) -> LoadResult<()> {
        let mut stack: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&index| self.graph[index].pending == 0)
            .collect();
        stack.reverse();

        let mut executed = 0usize;

        while let Some(index) = stack.pop() {
            let node = &mut self.graph[index];
            let key = node.key.clone();
            let action = node.action.take();

            debug!(stage = %key, "executing stage");

            if let Some(action) = action {
                if let Err(source) = action() {
                    return Err(LoadError::StageAction {
                        component: key.component,
                        stage: key.name,
                        source,
                    });
                }
            }

            executed += 1;

            // Neighbors iterate in reverse edge-insertion order; pushing them
            // as encountered makes the stack pop dependents in declaration
            // order, one subtree at a time.
            let dependents: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(index, Direction::Outgoing)
                .collect();
            for dependent in dependents {
                let node = &mut self.graph[dependent];
                node.pending -= 1;
                if node.pending == 0 {
                    stack.push(dependent);
                }
            }
        }

        if executed < self.graph.node_count() {
            let stages: Vec<StageKey> = self
                .graph
                .node_indices()
                .filter(|&index| self.graph[index].pending > 0)
                .map(|index| self.graph[index].key.clone())
                .collect();
            return Err(LoadError::Deadlock { stages });
        }

        info!(stages = executed, "executed all loading stages");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modkit_core::StageName;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Record = Rc<RefCell<Vec<String>>>;

    fn recording(record: &Record, component: &str, name: &str) -> StageRequest {
        let entry = format!("{component}[{name}]");
        let record = Rc::clone(record);
        StageRequest::new(component, StageName::named(name), move || {
            record.borrow_mut().push(entry);
            Ok(())
        })
    }

    fn position(record: &[String], entry: &str) -> usize {
        record
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry} never executed"))
    }

    fn assert_before(record: &[String], earlier: &str, later: &str) {
        assert!(
            position(record, earlier) < position(record, later),
            "{earlier} should run before {later}: {record:?}"
        );
    }

    #[test]
    fn test_chain_executes_in_order() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        // Declared deliberately out of order
        let requests = vec![
            recording(&record, "m", "c").after("m", StageName::named("b")),
            recording(&record, "m", "a").before("m", StageName::named("b")),
            recording(&record, "m", "b"),
        ];

        StageGraph::build(requests).unwrap().execute().unwrap();

        assert_eq!(*record.borrow(), ["m[a]", "m[b]", "m[c]"]);
    }

    #[test]
    fn test_cycle_reported_as_deadlock() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let requests = vec![
            recording(&record, "m", "a").after("m", StageName::named("b")),
            recording(&record, "m", "b").after("m", StageName::named("a")),
            recording(&record, "m", "free"),
        ];

        let err = StageGraph::build(requests).unwrap().execute().unwrap_err();

        match err {
            LoadError::Deadlock { stages } => {
                assert_eq!(
                    stages,
                    vec![
                        StageKey::new("m", StageName::named("a")),
                        StageKey::new("m", StageName::named("b")),
                    ]
                );
            }
            other => panic!("expected Deadlock, got {other}"),
        }

        // Unconstrained stages still ran before the deadlock was reported
        assert_eq!(*record.borrow(), ["m[free]"]);
    }

    #[test]
    fn test_failure_aborts_everything() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let failing = {
            let record = Rc::clone(&record);
            StageRequest::new("m", StageName::named("b"), move || {
                record.borrow_mut().push("m[b]".to_string());
                Err("b blew up".into())
            })
        };

        let requests = vec![
            recording(&record, "m", "a").before("m", StageName::named("b")),
            failing,
            recording(&record, "m", "c").after("m", StageName::named("b")),
            recording(&record, "n", "unrelated").after("m", StageName::named("a")),
        ];

        let err = StageGraph::build(requests).unwrap().execute().unwrap_err();

        match err {
            LoadError::StageAction { component, stage, source } => {
                assert_eq!(component, "m");
                assert_eq!(stage, StageName::named("b"));
                assert_eq!(source.to_string(), "b blew up");
            }
            other => panic!("expected StageAction, got {other}"),
        }

        // a ran, b was attempted; neither b's dependent nor the unrelated
        // pending stage executed afterwards
        assert_eq!(*record.borrow(), ["m[a]", "m[b]"]);
    }

    #[test]
    fn test_all_with_name_gates_on_every_owner() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let requests = vec![
            recording(&record, "base", "finalize").after_all(StageName::named("scan")),
            recording(&record, "base", "scan"),
            recording(&record, "lib", "scan"),
            recording(&record, "app", "scan"),
        ];

        StageGraph::build(requests).unwrap().execute().unwrap();

        let record = record.borrow();
        assert_before(&record, "base[scan]", "base[finalize]");
        assert_before(&record, "lib[scan]", "base[finalize]");
        assert_before(&record, "app[scan]", "base[finalize]");
    }

    #[test]
    fn test_all_except_owner_skips_own_stage() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        // after_all would self-deadlock here; after_others must not
        let requests = vec![
            recording(&record, "base", "scan").after_others(StageName::named("scan")),
            recording(&record, "lib", "scan"),
        ];

        StageGraph::build(requests).unwrap().execute().unwrap();

        assert_eq!(*record.borrow(), ["lib[scan]", "base[scan]"]);
    }

    #[test]
    fn test_matching_filter_orders_selected_owners() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let requests = vec![
            recording(&record, "app", "boot")
                .after_matching(StageName::named("init"), |owner| owner.starts_with("lib")),
            recording(&record, "lib-a", "init"),
            recording(&record, "lib-b", "init"),
            recording(&record, "other", "init"),
        ];

        StageGraph::build(requests).unwrap().execute().unwrap();

        let record = record.borrow();
        assert_before(&record, "lib-a[init]", "app[boot]");
        assert_before(&record, "lib-b[init]", "app[boot]");
        // "other" is unconstrained relative to boot; only presence matters
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let requests = vec![
            recording(&record, "m", "a"),
            recording(&record, "m", "a"),
        ];

        let err = StageGraph::build(requests).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateStage { .. }));
    }

    #[test]
    fn test_empty_graph_executes() {
        StageGraph::build(Vec::new()).unwrap().execute().unwrap();
    }

    #[test]
    fn test_fixed_order_overrides_declaration_order() {
        let record: Record = Rc::new(RefCell::new(Vec::new()));

        let mut requests = vec![
            recording(&record, "m", "third"),
            recording(&record, "m", "first"),
            recording(&record, "m", "second"),
        ];
        crate::request::fix_execution_order(&mut requests);

        StageGraph::build(requests).unwrap().execute().unwrap();

        assert_eq!(*record.borrow(), ["m[third]", "m[first]", "m[second]"]);
    }
}
