//! Stage ordering and execution for the modkit component loader
//!
//! Every resolved component declares a set of loading stages with ordering
//! filters against other components' stages. This crate derives the
//! precedence DAG those filters imply and executes it as a fail-fast,
//! single-threaded depth-first cascade, reporting any stage stranded in a
//! cycle as deadlocked.

pub mod graph;
pub mod request;

// Re-export main types
pub use graph::StageGraph;
pub use request::{fix_execution_order, StageAction, StageFilter, StageRequest};

pub use modkit_core::{StageKey, StageName};
