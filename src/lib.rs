//! Null Chain - fluent short-circuiting chains over optional results
//!
//! Replaces "if the result is present, call the next thing, otherwise skip"
//! and "catch, then substitute a default" boilerplate with one expression.
//! Each step runs only if the previous one produced a value; a failing step
//! is handed to registered error fallbacks and leaves the chain absent.
//!
//! # Quick Start
//!
//! ```ignore
//! use null_chain::Chain;
//! use null_chain::handlers::logging::FailureLogger;
//!
//! let avatar = Chain::from_fn(|| session.current_user())
//!     .with_global_error_fallback(FailureLogger::warn().handler())
//!     .then(|user| user.profile())
//!     .with_error_fallback(|failure| metrics.avatar_errors.incr())
//!     .try_then(|profile| storage.fetch_avatar(&profile))
//!     .or_else_with(|| assets.default_avatar())
//!     .into_value();
//! ```

pub mod core;
pub mod handlers;

// Convenience re-exports
pub use crate::core::chain::Chain;
pub use crate::core::ongoing_chain::OngoingChain;
pub use crate::core::step_failure::{BoxError, Fault, Stage, StepFailure};
