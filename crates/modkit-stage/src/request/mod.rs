//! Stage requests and ordering filters.
//!
//! A stage request carries one component's unit of initialization work plus
//! the declarative filters placing it relative to other stages. Filters are
//! tagged variants rather than opaque closures so the precedence pass stays
//! inspectable.

use modkit_core::{BoxError, StageKey, StageName};
use std::fmt;
use std::sync::Arc;

/// Fallible zero-argument work item executed at most once per load attempt
pub type StageAction = Box<dyn FnOnce() -> Result<(), BoxError>>;

/// Predicate over other stages used to order this one
#[derive(Clone)]
pub enum StageFilter {
    /// One specific stage of one specific component
    Exact(StageKey),
    /// Every stage with this name, whoever owns it
    AllWithName(StageName),
    /// Every stage with this name owned by another component
    AllExceptOwner { name: StageName, owner: String },
    /// Every stage with this name whose owner satisfies the predicate
    Matching {
        name: StageName,
        predicate: Arc<dyn Fn(&str) -> bool>,
    },
}

impl StageFilter {
    /// Whether the filter selects the given stage
    pub fn matches(&self, key: &StageKey) -> bool {
        match self {
            StageFilter::Exact(exact) => exact == key,
            StageFilter::AllWithName(name) => key.name == *name,
            StageFilter::AllExceptOwner { name, owner } => {
                key.name == *name && key.component != *owner
            }
            StageFilter::Matching { name, predicate } => {
                key.name == *name && predicate(&key.component)
            }
        }
    }
}

impl fmt::Debug for StageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFilter::Exact(key) => write!(f, "Exact({key})"),
            StageFilter::AllWithName(name) => write!(f, "AllWithName({name})"),
            StageFilter::AllExceptOwner { name, owner } => {
                write!(f, "AllExceptOwner({name}, owner: {owner})")
            }
            StageFilter::Matching { name, .. } => write!(f, "Matching({name}, ..)"),
        }
    }
}

/// One component's request for a named loading stage
pub struct StageRequest {
    key: StageKey,
    action: Option<StageAction>,
    after: Vec<StageFilter>,
    before: Vec<StageFilter>,
}

impl StageRequest {
    /// Create a request owned by `component` with the given work item
    pub fn new(
        component: impl Into<String>,
        name: StageName,
        action: impl FnOnce() -> Result<(), BoxError> + 'static,
    ) -> Self {
        Self {
            key: StageKey::new(component, name),
            action: Some(Box::new(action)),
            after: Vec::new(),
            before: Vec::new(),
        }
    }

    /// Identity of the requested stage
    pub fn key(&self) -> &StageKey {
        &self.key
    }

    // BUILDER METHODS

    /// Run after a specific stage of a specific component
    pub fn after(mut self, component: &str, name: StageName) -> Self {
        self.after.push(StageFilter::Exact(StageKey::new(component, name)));
        self
    }

    /// Run before a specific stage of a specific component
    pub fn before(mut self, component: &str, name: StageName) -> Self {
        self.before.push(StageFilter::Exact(StageKey::new(component, name)));
        self
    }

    /// Run after every component completes the named stage
    pub fn after_all(mut self, name: StageName) -> Self {
        self.after.push(StageFilter::AllWithName(name));
        self
    }

    /// Run before any component executes the named stage
    pub fn before_all(mut self, name: StageName) -> Self {
        self.before.push(StageFilter::AllWithName(name));
        self
    }

    /// Run after every other component completes the named stage
    pub fn after_others(mut self, name: StageName) -> Self {
        self.after.push(StageFilter::AllExceptOwner {
            name,
            owner: self.key.component.clone(),
        });
        self
    }

    /// Run before any other component executes the named stage
    pub fn before_others(mut self, name: StageName) -> Self {
        self.before.push(StageFilter::AllExceptOwner {
            name,
            owner: self.key.component.clone(),
        });
        self
    }

    /// Run after the named stage of every component the predicate accepts
    pub fn after_matching(
        mut self,
        name: StageName,
        predicate: impl Fn(&str) -> bool + 'static,
    ) -> Self {
        self.after.push(StageFilter::Matching {
            name,
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Run before the named stage of every component the predicate accepts
    pub fn before_matching(
        mut self,
        name: StageName,
        predicate: impl Fn(&str) -> bool + 'static,
    ) -> Self {
        self.before.push(StageFilter::Matching {
            name,
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Run after another request's stage
    pub fn after_request(mut self, other: &StageRequest) -> Self {
        self.after.push(StageFilter::Exact(other.key.clone()));
        self
    }

    /// Run before another request's stage
    pub fn before_request(mut self, other: &StageRequest) -> Self {
        self.before.push(StageFilter::Exact(other.key.clone()));
        self
    }

    // PRECEDENCE EVALUATION

    pub(crate) fn runs_before(&self, other: &StageKey) -> bool {
        self.before.iter().any(|filter| filter.matches(other))
    }

    pub(crate) fn runs_after(&self, other: &StageKey) -> bool {
        self.after.iter().any(|filter| filter.matches(other))
    }

    pub(crate) fn take_action(&mut self) -> Option<StageAction> {
        self.action.take()
    }
}

impl fmt::Debug for StageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRequest")
            .field("key", &self.key)
            .field("after", &self.after)
            .field("before", &self.before)
            .finish_non_exhaustive()
    }
}

/// Force a sequence of requests to execute in list order by chaining a
/// before-edge between each consecutive pair.
pub fn fix_execution_order(requests: &mut [StageRequest]) {
    for i in 1..requests.len() {
        let next = requests[i].key.clone();
        requests[i - 1].before.push(StageFilter::Exact(next));
    }
}
