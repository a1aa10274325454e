//! Running RMSE over completed pairs and the emission filter in front of the error series.

use crate::join::{JoinState, JoinTable};

/// Root-mean-square error over the current value of every completed pair.
///
/// New pairs are folded in incrementally. A revision rebuilds the sum from the
/// table, since subtracting the old contribution can cancel away every other
/// pair's error.
#[derive(Debug, Clone, Default)]
pub struct MetricEngine {
    count: u64,
    sum_squared_error: f64,
}

impl MetricEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one join transition in. `table` must already reflect it.
    ///
    /// Returns the new RMSE only when a pair was completed or an already
    /// complete pair changed value.
    pub fn observe(&mut self, state: &JoinState, table: &JoinTable) -> Option<f64> {
        match *state {
            JoinState::Pending | JoinState::Unchanged => None,
            JoinState::Completed { truth, prediction } => {
                self.count += 1;
                self.sum_squared_error += squared_error(truth, prediction);
                Some(self.current_value())
            }
            JoinState::Revised { .. } => {
                self.recompute(table);
                Some(self.current_value())
            }
        }
    }

    /// Rebuild count and sum from the completed entries of `table`.
    pub fn recompute(&mut self, table: &JoinTable) {
        let (count, sum) = table
            .completed_pairs()
            .fold((0u64, 0.0), |(n, sum), (t, p)| (n + 1, sum + squared_error(t, p)));
        self.count = count;
        self.sum_squared_error = sum;
    }

    pub fn current_value(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_squared_error / self.count as f64).sqrt()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum_squared_error(&self) -> f64 {
        self.sum_squared_error
    }
}

fn squared_error(truth: f64, prediction: f64) -> f64 {
    let e = truth - prediction;
    e * e
}

/// Suppresses zero, non-finite and repeated values.
#[derive(Debug, Clone, Default)]
pub struct EmissionFilter {
    last: Option<f64>,
}

impl EmissionFilter {
    pub fn new(last: Option<f64>) -> Self {
        Self { last }
    }

    /// Repeats are compared bit for bit, so a NaN already on disk still matches itself.
    pub fn should_emit(&self, value: f64) -> bool {
        value.is_finite()
            && value != 0.0
            && self.last.map(f64::to_bits) != Some(value.to_bits())
    }

    pub fn record(&mut self, value: f64) {
        self.last = Some(value);
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CorrelationKey, Field, FieldEvent};

    struct Fixture {
        table: JoinTable,
        engine: MetricEngine,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                table: JoinTable::new(),
                engine: MetricEngine::new(),
            }
        }

        fn feed(&mut self, ts: f64, field: Field, value: f64) -> Option<f64> {
            let state = self.table.apply(&FieldEvent {
                key: CorrelationKey::new(ts),
                field,
                value,
                arrival_seq: 0,
            });
            self.engine.observe(&state, &self.table)
        }

        fn pair(&mut self, ts: f64, truth: f64, prediction: f64) -> Option<f64> {
            self.feed(ts, Field::Truth, truth);
            self.feed(ts, Field::Prediction, prediction)
        }
    }

    #[test]
    fn empty_engine_reports_zero() {
        let engine = MetricEngine::new();
        assert_eq!(engine.current_value(), 0.0);
        assert_eq!(engine.count(), 0);
    }

    #[test]
    fn pending_and_duplicates_yield_nothing() {
        let mut f = Fixture::new();
        assert_eq!(f.feed(1.0, Field::Truth, 5.0), None);
        f.feed(1.0, Field::Prediction, 3.0);
        assert_eq!(f.feed(1.0, Field::Prediction, 3.0), None);
    }

    #[test]
    fn rmse_accumulates_over_all_pairs() {
        let mut f = Fixture::new();
        assert_eq!(f.pair(1.0, 5.0, 3.0), Some(2.0));
        let v = f.pair(2.0, 5.0, 5.0).unwrap();
        assert!((v - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(f.engine.count(), 2);
    }

    #[test]
    fn revision_replaces_the_pair_contribution() {
        let mut f = Fixture::new();
        f.pair(1.0, 5.0, 3.0);
        assert_eq!(f.feed(1.0, Field::Prediction, 4.0), Some(1.0));
        assert_eq!(f.engine.count(), 1);
    }

    #[test]
    fn revising_a_huge_error_keeps_the_small_ones() {
        let mut f = Fixture::new();
        f.pair(1.0, 1e10, 0.0);
        f.pair(2.0, 1.0, 0.0);

        let v = f.feed(1.0, Field::Prediction, 1e10).unwrap();
        assert!((v - 0.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(f.engine.sum_squared_error(), 1.0);
    }

    #[test]
    fn overflowed_pair_recovers_after_revision() {
        let mut f = Fixture::new();
        assert_eq!(f.pair(1.0, 1e200, -1e200), Some(f64::INFINITY));
        assert_eq!(f.feed(1.0, Field::Prediction, 1e200), Some(0.0));

        let v = f.pair(2.0, 3.0, 1.0).unwrap();
        assert!((v - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn filter_drops_zero_and_repeats() {
        let mut filter = EmissionFilter::default();
        assert!(!filter.should_emit(0.0));
        assert!(filter.should_emit(2.0));
        filter.record(2.0);
        assert!(!filter.should_emit(2.0));
        assert!(filter.should_emit(1.5));
    }

    #[test]
    fn filter_never_emits_non_finite_values() {
        let filter = EmissionFilter::default();
        assert!(!filter.should_emit(f64::INFINITY));
        assert!(!filter.should_emit(f64::NAN));

        let after_nan = EmissionFilter::new(Some(f64::NAN));
        assert!(after_nan.should_emit(1.0));
    }

    #[test]
    fn filter_resumes_from_persisted_tail() {
        let filter = EmissionFilter::new(Some(1.25));
        assert!(!filter.should_emit(1.25));
        assert_eq!(filter.last(), Some(1.25));
    }
}
