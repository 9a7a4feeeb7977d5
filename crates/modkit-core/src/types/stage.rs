//! Stage identifiers.
//!
//! Stages are named units of initialization work owned by a component. The
//! `Start` and `End` names are the conventional brackets every component's
//! loading process is wrapped in.

use std::fmt;

/// Opaque comparable name of a loading stage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageName {
    /// Fired when a component's loading process begins
    Start,
    /// Fired when a component's loading process completes
    End,
    Named(String),
}

/// Identity of one stage within a load attempt: owning component plus name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageKey {
    pub component: String,
    pub name: StageName,
}

impl StageName {
    /// Create a custom stage name
    pub fn named(name: impl Into<String>) -> Self {
        StageName::Named(name.into())
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageName::Start => f.write_str("start"),
            StageName::End => f.write_str("end"),
            StageName::Named(name) => f.write_str(name),
        }
    }
}

impl StageKey {
    /// Create a stage key
    pub fn new(component: impl Into<String>, name: StageName) -> Self {
        Self {
            component: component.into(),
            name,
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.component, self.name)
    }
}
