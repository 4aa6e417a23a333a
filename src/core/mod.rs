/// Entry points that start a chain
pub mod chain;

/// The chain cursor with `then`, `or_else` and error fallbacks
pub mod ongoing_chain;

/// Failure information passed to error fallbacks
pub mod step_failure;

mod guard;
