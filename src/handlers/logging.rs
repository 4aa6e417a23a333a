use tracing::{Level, debug, error, info, trace, warn};

use crate::core::step_failure::StepFailure;

/// Error fallback that logs each failure through `tracing`
///
/// Meant for [`with_global_error_fallback`](crate::OngoingChain::with_global_error_fallback)
/// so every failure in a chain is observed in one place, while local
/// fallbacks deal with recovery.
///
/// # Example
///
/// ```ignore
/// use null_chain::Chain;
/// use null_chain::handlers::logging::FailureLogger;
///
/// let user = Chain::of(id)
///     .with_global_error_fallback(FailureLogger::warn().with_message("user lookup").handler())
///     .try_then(|id| repo.find(id))
///     .into_value();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureLogger {
    level: Level,
    message: &'static str,
}

impl FailureLogger {
    /// Create a logger emitting events at `level`
    pub fn new(level: Level) -> Self {
        Self {
            level,
            message: "chain failure",
        }
    }

    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    pub fn warn() -> Self {
        Self::new(Level::WARN)
    }

    pub fn error() -> Self {
        Self::new(Level::ERROR)
    }

    /// Replace the event message (defaults to `"chain failure"`)
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = message;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Emit one event for `failure`
    pub fn log(&self, failure: &StepFailure) {
        let position = failure.position;
        let stage = failure.stage;
        let panicked = failure.is_panic();
        let fault = &failure.fault;
        let message = self.message;

        // tracing needs the level at compile time
        if self.level == Level::TRACE {
            trace!(position, %stage, panicked, error = %fault, "{message}");
        } else if self.level == Level::DEBUG {
            debug!(position, %stage, panicked, error = %fault, "{message}");
        } else if self.level == Level::INFO {
            info!(position, %stage, panicked, error = %fault, "{message}");
        } else if self.level == Level::WARN {
            warn!(position, %stage, panicked, error = %fault, "{message}");
        } else {
            error!(position, %stage, panicked, error = %fault, "{message}");
        }
    }

    /// Turn the logger into a handler for either error fallback
    pub fn handler(self) -> impl Fn(&StepFailure) {
        move |failure: &StepFailure| self.log(failure)
    }
}

impl Default for FailureLogger {
    fn default() -> Self {
        Self::warn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;
    use crate::core::step_failure::Fault;

    #[test]
    fn default_logs_at_warn() {
        assert_eq!(FailureLogger::default().level(), Level::WARN);
        assert_eq!(FailureLogger::error().level(), Level::ERROR);
    }

    #[test]
    fn handler_accepts_failures_without_subscriber() {
        let handler = FailureLogger::debug().with_message("lookup").handler();
        handler(&StepFailure::step(1, Fault::Panic("boom".to_string())));
    }

    #[test]
    fn works_as_local_and_global_fallback() {
        let chain = Chain::of(1)
            .with_global_error_fallback(FailureLogger::warn().handler())
            .with_error_fallback(FailureLogger::debug().handler())
            .try_then(|_| Err::<Option<i32>, _>("unavailable"))
            .or_else(0);

        assert_eq!(chain.into_value(), Some(0));
    }
}
