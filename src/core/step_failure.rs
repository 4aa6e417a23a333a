use std::fmt;

use thiserror::Error;

/// Boxed error accepted from fallible steps and producers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where in the chain a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// A `then` step
    Step,
    /// An `or_else` fallback producer
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Step => write!(f, "step"),
            Stage::Fallback => write!(f, "fallback"),
        }
    }
}

/// What went wrong inside a step or producer
#[derive(Debug, Error)]
pub enum Fault {
    #[error("returned an error: {0}")]
    Error(#[source] BoxError),
    #[error("panicked: {0}")]
    Panic(String),
}

impl Fault {
    pub fn is_panic(&self) -> bool {
        matches!(self, Fault::Panic(_))
    }
}

/// Failure information handed to error-fallback handlers
///
/// `position` counts the `then` steps applied since the chain started, so the
/// first step fails at position 1. A fallback failure reports the position of
/// the chain it was registered on.
#[derive(Debug, Error)]
#[error("{stage} at position {position} {fault}")]
pub struct StepFailure {
    pub position: usize,
    pub stage: Stage,
    #[source]
    pub fault: Fault,
}

impl StepFailure {
    pub fn new(position: usize, stage: Stage, fault: Fault) -> Self {
        Self {
            position,
            stage,
            fault,
        }
    }

    pub fn step(position: usize, fault: Fault) -> Self {
        Self::new(position, Stage::Step, fault)
    }

    pub fn fallback(position: usize, fault: Fault) -> Self {
        Self::new(position, Stage::Fallback, fault)
    }

    pub fn is_panic(&self) -> bool {
        self.fault.is_panic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_names_stage_position_and_fault() {
        let failure = StepFailure::step(2, Fault::Error("no such user".into()));
        assert_eq!(
            failure.to_string(),
            "step at position 2 returned an error: no such user"
        );

        let failure = StepFailure::fallback(0, Fault::Panic("boom".to_string()));
        assert_eq!(failure.to_string(), "fallback at position 0 panicked: boom");
    }

    #[test]
    fn source_chain_reaches_step_error() {
        let failure = StepFailure::step(1, Fault::Error("disk full".into()));
        let fault = failure.source().map(|e| e.to_string());
        assert_eq!(fault.as_deref(), Some("returned an error: disk full"));

        let inner = failure.fault.source().map(|e| e.to_string());
        assert_eq!(inner.as_deref(), Some("disk full"));
        assert!(!failure.is_panic());
    }
}
