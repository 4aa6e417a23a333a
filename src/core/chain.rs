use std::convert::Infallible;

use crate::core::guard;
use crate::core::ongoing_chain::OngoingChain;
use crate::core::step_failure::BoxError;

/// Entry point for building a chain
///
/// Starting a chain never fails: a producer that errors or panics simply
/// yields an absent chain. No handler can observe that failure since handlers
/// are registered on the chain this returns.
///
/// # Example
///
/// ```ignore
/// use null_chain::Chain;
///
/// let name = Chain::of(user_id)
///     .then(|id| directory.lookup(id))
///     .map(|entry| entry.display_name)
///     .or_else("anonymous".to_string())
///     .into_value();
/// ```
pub struct Chain;

impl Chain {
    /// Start a chain from a present value
    pub fn of<'h, T>(value: T) -> OngoingChain<'h, T> {
        OngoingChain::new(Some(value))
    }

    /// Start a chain from a value that may already be absent
    pub fn of_option<'h, T>(value: Option<T>) -> OngoingChain<'h, T> {
        OngoingChain::new(value)
    }

    /// Start a chain from the result of `producer`, called once right away
    ///
    /// A panic inside the producer yields an absent chain. The chain does not
    /// log it, but the process panic hook still runs, so the default hook
    /// prints the panic message to stderr.
    pub fn from_fn<'h, T, F>(producer: F) -> OngoingChain<'h, T>
    where
        F: FnOnce() -> Option<T>,
    {
        Self::try_from_fn(|| Ok::<_, Infallible>(producer()))
    }

    /// Start a chain from a fallible `producer`, called once right away
    ///
    /// Both `Err` and panics yield an absent chain.
    pub fn try_from_fn<'h, T, E, F>(producer: F) -> OngoingChain<'h, T>
    where
        F: FnOnce() -> Result<Option<T>, E>,
        E: Into<BoxError>,
    {
        OngoingChain::new(guard::run(producer).ok().flatten())
    }
}
