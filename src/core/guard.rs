use std::any::Any;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::core::step_failure::{BoxError, Fault};

/// Run a step or producer, turning both `Err` and panics into a [`Fault`]
pub(crate) fn run<R, E, F>(f: F) -> Result<R, Fault>
where
    F: FnOnce() -> Result<R, E>,
    E: Into<BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Fault::Error(err.into())),
        Err(payload) => Err(Fault::Panic(panic_message(payload.as_ref()))),
    }
}

/// Call an error fallback; a panic inside it is logged and dropped
pub(crate) fn notify<F>(handler: &'static str, f: F)
where
    F: FnOnce(),
{
    if let Err(fault) = run(|| {
        f();
        Ok::<_, Infallible>(())
    }) {
        debug!(handler, error = %fault, "error fallback failed, ignoring");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn passes_through_success() {
        let result = run(|| Ok::<_, Infallible>(Some(7)));
        assert!(matches!(result, Ok(Some(7))));
    }

    #[test]
    fn captures_returned_error() {
        let result: Result<Option<u8>, Fault> = run(|| Err("lookup failed"));
        match result {
            Err(Fault::Error(err)) => assert_eq!(err.to_string(), "lookup failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn captures_panics_with_str_and_string_payloads() {
        let result: Result<(), Fault> = run(|| -> Result<(), Infallible> { panic!("static") });
        assert!(matches!(result, Err(Fault::Panic(ref m)) if m == "static"));

        let code = 42;
        let result: Result<(), Fault> =
            run(|| -> Result<(), Infallible> { panic!("code {code}") });
        assert!(matches!(result, Err(Fault::Panic(ref m)) if m == "code 42"));
    }

    #[test]
    fn notify_swallows_handler_panic() {
        let mut ran = false;
        notify("local", || ran = true);
        assert!(ran);

        notify("local", || panic!("handler blew up"));
    }

    #[test]
    fn renders_opaque_payload() {
        let result: Result<(), Fault> =
            run(|| -> Result<(), Infallible> { std::panic::panic_any(17u32) });
        assert!(matches!(result, Err(Fault::Panic(ref m)) if m == "non-string panic payload"));
    }
}
