use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use tracing::debug;

use crate::core::step_failure::{Stage, StepFailure};

/// Snapshot of a single failure seen by a [`FailureCollector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub position: usize,
    pub stage: Stage,
    pub message: String,
    pub panicked: bool,
}

impl From<&StepFailure> for FailureRecord {
    fn from(failure: &StepFailure) -> Self {
        Self {
            position: failure.position,
            stage: failure.stage,
            message: failure.fault.to_string(),
            panicked: failure.is_panic(),
        }
    }
}

#[derive(Debug, Default)]
struct Collected {
    records: Vec<FailureRecord>,
    by_position: HashMap<usize, u64>,
}

/// Error fallback that keeps every failure for later review
///
/// Cheap to clone; all clones share the same storage, so one clone can be
/// handed to a chain while another is kept for inspection.
///
/// # Example
///
/// ```ignore
/// use null_chain::Chain;
/// use null_chain::handlers::collector::FailureCollector;
///
/// let failures = FailureCollector::new();
///
/// let total = Chain::of(order)
///     .with_global_error_fallback(failures.handler())
///     .try_then(|order| pricing.quote(order))
///     .try_then(|quote| tax.apply(quote))
///     .unwrap_or(Money::ZERO);
///
/// for record in failures.records() {
///     println!("{} at {}: {}", record.stage, record.position, record.message);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FailureCollector {
    inner: Rc<RefCell<Collected>>,
}

impl FailureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `failure`
    ///
    /// Skipped, with a `debug` event, if the storage is already borrowed.
    pub fn record(&self, failure: &StepFailure) {
        match self.inner.try_borrow_mut() {
            Ok(mut collected) => {
                *collected.by_position.entry(failure.position).or_insert(0) += 1;
                collected.records.push(FailureRecord::from(failure));
            }
            Err(_) => debug!(
                position = failure.position,
                stage = %failure.stage,
                "failure collector busy, dropping failure"
            ),
        }
    }

    /// A handler feeding this collector, for either error fallback
    pub fn handler(&self) -> Box<dyn Fn(&StepFailure)> {
        let collector = self.clone();
        Box::new(move |failure: &StepFailure| collector.record(failure))
    }

    /// All failures recorded so far, oldest first
    pub fn records(&self) -> Vec<FailureRecord> {
        self.inner
            .try_borrow()
            .map(|collected| collected.records.clone())
            .unwrap_or_default()
    }

    /// Number of failures recorded at chain `position`
    pub fn count_at(&self, position: usize) -> u64 {
        self.inner
            .try_borrow()
            .ok()
            .and_then(|collected| collected.by_position.get(&position).copied())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner
            .try_borrow()
            .map(|collected| collected.records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        if let Ok(mut collected) = self.inner.try_borrow_mut() {
            collected.records.clear();
            collected.by_position.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step_failure::Fault;

    #[test]
    fn records_failures_in_order() {
        let collector = FailureCollector::new();
        collector.record(&StepFailure::step(1, Fault::Error("first".into())));
        collector.record(&StepFailure::fallback(1, Fault::Panic("second".to_string())));

        let records = collector.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stage, Stage::Step);
        assert_eq!(records[0].message, "returned an error: first");
        assert!(!records[0].panicked);
        assert_eq!(records[1].stage, Stage::Fallback);
        assert!(records[1].panicked);
        assert_eq!(collector.count_at(1), 2);
        assert_eq!(collector.count_at(2), 0);
    }

    #[test]
    fn clones_share_storage() {
        let collector = FailureCollector::new();
        let handler = collector.handler();
        handler(&StepFailure::step(3, Fault::Error("x".into())));

        assert_eq!(collector.len(), 1);
        assert!(!collector.is_empty());
    }

    #[test]
    fn record_while_storage_borrowed_is_dropped() {
        let collector = FailureCollector::new();
        {
            let _held = collector.inner.borrow();
            collector.record(&StepFailure::step(1, Fault::Error("x".into())));
        }

        assert!(collector.is_empty());
        assert_eq!(collector.count_at(1), 0);
    }

    #[test]
    fn clear_resets_records_and_counts() {
        let collector = FailureCollector::new();
        collector.record(&StepFailure::step(1, Fault::Error("x".into())));
        collector.clear();

        assert!(collector.is_empty());
        assert_eq!(collector.count_at(1), 0);
    }
}
