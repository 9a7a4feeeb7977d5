//! Error types and result aliases for loading operations.
//!
//! Provides a unified error type covering every terminal failure of a load
//! attempt, with full context about which component, stage, or requirement
//! caused it. Relaxation during version selection is internal backtracking
//! and never surfaces here unless exhausted.

use crate::types::{Dependency, StageKey, StageName};
use thiserror::Error;

/// Boxed error type used for pass-through failures from collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for all loading operations
#[derive(Error, Debug)]
pub enum LoadError {
    /// No relaxation sequence yields a consistent version assignment
    #[error("unable to satisfy requirements [{}] with provider '{provider}'",
        .requirements.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", "))]
    GraphUnsatisfiable {
        requirements: Vec<Dependency>,
        provider: String,
    },

    /// The relaxation iteration ceiling tripped before a fixpoint was found
    #[error("version selection exceeded {attempts} steps without converging")]
    ResolutionBudgetExhausted { attempts: usize },

    /// Constructing a resolved component failed; the provider's error is
    /// passed through unmodified
    #[error("failed to construct component '{component}'")]
    Construction {
        component: String,
        #[source]
        source: BoxError,
    },

    /// A stage action failed; the load aborts immediately and the action is
    /// never retried
    #[error("stage '{stage}' of component '{component}' failed")]
    StageAction {
        component: String,
        stage: StageName,
        #[source]
        source: BoxError,
    },

    /// Stages whose predecessor count never reached zero
    #[error("unable to execute stages [{}] due to deadlock",
        .stages.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "))]
    Deadlock { stages: Vec<StageKey> },

    /// Two stage requests from one component share a name
    #[error("component '{component}' declared stage '{stage}' more than once")]
    DuplicateStage {
        component: String,
        stage: StageName,
    },
}

/// Result type alias for loading operations
pub type LoadResult<T> = Result<T, LoadError>;
