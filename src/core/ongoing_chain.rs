use std::cell::Cell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::guard;
use crate::core::step_failure::{BoxError, StepFailure};

type LocalHandler<'h> = Box<dyn FnOnce(&StepFailure) + 'h>;
type GlobalHandler<'h> = dyn Fn(&StepFailure) + 'h;

/// A chain in progress
///
/// Holds the current result (present or absent) together with the error
/// fallbacks consulted when a step fails. Every operation consumes the chain
/// and hands back the next one, so a whole pipeline reads as one expression:
///
/// ```ignore
/// let email = Chain::from_fn(|| repo.find_user(id))
///     .with_global_error_fallback(|failure| warn!(%failure, "lookup failed"))
///     .then(|user| user.primary_address())
///     .try_then(|address| mailer.verify(address))
///     .or_else(default_address)
///     .into_value();
/// ```
///
/// # Handlers
///
/// * **Local** ([`with_error_fallback`](Self::with_error_fallback)): single-use,
///   consumed by the next `then*` call whether or not that step fails
/// * **Global** ([`with_global_error_fallback`](Self::with_global_error_fallback)):
///   carried into every chain derived from this one
///
/// When a step fails the local handler runs first, then the global one.
pub struct OngoingChain<'h, T> {
    slot: Option<T>,
    position: usize,
    local: Rc<Cell<Option<LocalHandler<'h>>>>,
    global: Option<Rc<GlobalHandler<'h>>>,
}

impl<'h, T> OngoingChain<'h, T> {
    pub(crate) fn new(slot: Option<T>) -> Self {
        Self::derived(slot, 0, None)
    }

    fn derived(slot: Option<T>, position: usize, global: Option<Rc<GlobalHandler<'h>>>) -> Self {
        Self {
            slot,
            position,
            local: Rc::new(Cell::new(None)),
            global,
        }
    }

    /// Apply `step` to the current value if there is one
    ///
    /// A `None` from the step makes the next chain absent. If the current
    /// chain is already absent the step is never called.
    ///
    /// A panic inside the step is caught and routed to the error fallbacks;
    /// the returned chain is then absent. Catching relies on unwinding, and
    /// the process panic hook still runs, so the default hook prints the
    /// panic message to stderr. A panic inside an error fallback is dropped.
    pub fn then<U, F>(self, step: F) -> OngoingChain<'h, U>
    where
        F: FnOnce(T) -> Option<U>,
    {
        self.apply(|value| Ok::<_, Infallible>(step(value)))
    }

    /// Like [`then`](Self::then) for steps that always produce a value
    pub fn map<U, F>(self, step: F) -> OngoingChain<'h, U>
    where
        F: FnOnce(T) -> U,
    {
        self.apply(|value| Ok::<_, Infallible>(Some(step(value))))
    }

    /// Apply a fallible `step` to the current value if there is one
    ///
    /// An `Err` is handed to the local handler, then to the global handler,
    /// and the returned chain is absent. The error never reaches the caller.
    pub fn try_then<U, E, F>(self, step: F) -> OngoingChain<'h, U>
    where
        F: FnOnce(T) -> Result<Option<U>, E>,
        E: Into<BoxError>,
    {
        self.apply(step)
    }

    fn apply<U, E, F>(self, step: F) -> OngoingChain<'h, U>
    where
        F: FnOnce(T) -> Result<Option<U>, E>,
        E: Into<BoxError>,
    {
        let position = self.position + 1;
        let local = self.local.take();
        let global = self.global;

        let Some(value) = self.slot else {
            trace!(position, "chain is absent, skipping step");
            return OngoingChain::derived(None, position, global);
        };

        match guard::run(|| step(value)) {
            Ok(next) => OngoingChain::derived(next, position, global),
            Err(fault) => {
                let failure = StepFailure::step(position, fault);
                debug!(position, stage = %failure.stage, error = %failure.fault, "chain step failed");

                if let Some(handler) = local {
                    guard::notify("local", || handler(&failure));
                }
                if let Some(handler) = &global {
                    guard::notify("global", || handler(&failure));
                }

                OngoingChain::derived(None, position, global)
            }
        }
    }

    /// Substitute `fallback` if the chain is absent
    pub fn or_else(mut self, fallback: T) -> Self {
        if self.slot.is_none() {
            self.slot = Some(fallback);
        }
        self
    }

    /// Substitute a fallback that may itself be absent
    ///
    /// Useful in a sequence of fallbacks: the first one that is present wins.
    pub fn or_else_option(mut self, fallback: Option<T>) -> Self {
        if self.slot.is_none() {
            self.slot = fallback;
        }
        self
    }

    /// Call `producer` for a fallback only if the chain is absent
    ///
    /// The producer runs at most once. A panic leaves the chain absent and is
    /// reported to the global handler.
    pub fn or_else_with<F>(self, producer: F) -> Self
    where
        F: FnOnce() -> Option<T>,
    {
        self.try_or_else_with(|| Ok::<_, Infallible>(producer()))
    }

    /// Call a fallible `producer` for a fallback only if the chain is absent
    ///
    /// An `Err` leaves the chain absent and is reported to the global handler.
    /// The local handler is left for the next step.
    pub fn try_or_else_with<E, F>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Result<Option<T>, E>,
        E: Into<BoxError>,
    {
        if self.slot.is_some() {
            return self;
        }

        match guard::run(producer) {
            Ok(fallback) => self.slot = fallback,
            Err(fault) => {
                let failure = StepFailure::fallback(self.position, fault);
                debug!(position = self.position, stage = %failure.stage, error = %failure.fault, "chain fallback failed");

                if let Some(handler) = &self.global {
                    guard::notify("global", || handler(&failure));
                }
            }
        }
        self
    }

    /// Register a single-use handler for the next step's failure
    ///
    /// Replaces any local handler already set. The handler is dropped by the
    /// next `then*` call even if that step succeeds or is skipped.
    pub fn with_error_fallback<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&StepFailure) + 'h,
    {
        let handler: LocalHandler<'h> = Box::new(handler);
        self.local = Rc::new(Cell::new(Some(handler)));
        self
    }

    /// Register a handler for every later failure in this chain
    ///
    /// Replaces any global handler already set. Chains derived from this one
    /// keep calling it until it is replaced.
    pub fn with_global_error_fallback<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StepFailure) + 'h,
    {
        let handler: Rc<GlobalHandler<'h>> = Rc::new(handler);
        self.global = Some(handler);
        self
    }

    /// Current value, if present
    pub fn value(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    /// Finish the chain and take its value
    pub fn into_value(self) -> Option<T> {
        self.slot
    }

    /// Finish the chain, substituting `default` if absent
    pub fn unwrap_or(self, default: T) -> T {
        self.slot.unwrap_or(default)
    }

    pub fn is_present(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_absent(&self) -> bool {
        self.slot.is_none()
    }

    /// Number of `then*` steps applied since the chain started
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Clones share the local handler slot: whichever clone steps first uses it up.
impl<T: Clone> Clone for OngoingChain<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            position: self.position,
            local: Rc::clone(&self.local),
            global: self.global.clone(),
        }
    }
}

impl<'h, T> From<OngoingChain<'h, T>> for Option<T> {
    fn from(chain: OngoingChain<'h, T>) -> Self {
        chain.into_value()
    }
}

impl<T: fmt::Debug> fmt::Debug for OngoingChain<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Peek at the shared slot without consuming the handler.
        let local = self.local.take();
        let has_local = local.is_some();
        self.local.set(local);

        f.debug_struct("OngoingChain")
            .field("slot", &self.slot)
            .field("position", &self.position)
            .field("local_fallback", &has_local)
            .field("global_fallback", &self.global.is_some())
            .finish()
    }
}
