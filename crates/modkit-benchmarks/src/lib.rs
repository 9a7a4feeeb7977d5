//! Modkit benchmarking suite
//!
//! This crate contains benchmarks for the resolution and stage-execution
//! paths: version selection over deep dependency chains, relaxation under
//! conflicting constraints, and precedence-graph construction.

pub mod common;

pub use common::*;
