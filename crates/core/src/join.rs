//! Keyed store reconciling one-sided records into completed pairs.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{CorrelationKey, Field, FieldEvent};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JoinEntry {
    pub truth: Option<f64>,
    pub prediction: Option<f64>,
}

impl JoinEntry {
    pub fn is_complete(&self) -> bool {
        self.pair().is_some()
    }

    /// `(truth, prediction)` once both sides are present.
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.truth?, self.prediction?))
    }

    fn slot(&mut self, field: Field) -> &mut Option<f64> {
        match field {
            Field::Truth => &mut self.truth,
            Field::Prediction => &mut self.prediction,
        }
    }
}

/// Outcome of applying one event to the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinState {
    /// Only one side is known for this key.
    Pending,
    /// This event supplied the missing side.
    Completed { truth: f64, prediction: f64 },
    /// The entry was already complete and one side changed value.
    Revised {
        previous: (f64, f64),
        current: (f64, f64),
    },
    /// The entry was already complete and the event repeated a known value.
    Unchanged,
}

impl JoinState {
    pub fn is_complete(&self) -> bool {
        !matches!(self, JoinState::Pending)
    }
}

pub struct JoinTable {
    entries: BTreeMap<CorrelationKey, JoinEntry>,
    pending: BTreeSet<CorrelationKey>,
    max_pending: Option<usize>,
    evicted_total: u64,
}

impl JoinTable {
    pub fn new() -> Self {
        Self::with_max_pending(None)
    }

    /// Cap the number of one-sided entries; the smallest key goes first.
    pub fn with_max_pending(max_pending: Option<usize>) -> Self {
        Self {
            entries: BTreeMap::new(),
            pending: BTreeSet::new(),
            max_pending,
            evicted_total: 0,
        }
    }

    /// Upsert `event.field` for `event.key`, overwriting any earlier value of that field.
    pub fn apply(&mut self, event: &FieldEvent) -> JoinState {
        let entry = self.entries.entry(event.key).or_default();
        let before = entry.pair();
        *entry.slot(event.field) = Some(event.value);
        let after = entry.pair();

        let state = match (before, after) {
            (None, None) => JoinState::Pending,
            (None, Some((truth, prediction))) => JoinState::Completed { truth, prediction },
            (Some(previous), Some(current)) if previous == current => JoinState::Unchanged,
            (Some(previous), Some(current)) => JoinState::Revised { previous, current },
            (Some(_), None) => unreachable!("fields are never cleared"),
        };

        match state {
            JoinState::Pending => {
                self.pending.insert(event.key);
                self.evict_overflow(event.key);
            }
            JoinState::Completed { .. } => {
                self.pending.remove(&event.key);
            }
            _ => {}
        }

        state
    }

    fn evict_overflow(&mut self, keep: CorrelationKey) {
        let Some(max) = self.max_pending else {
            return;
        };

        while self.pending.len() > max {
            let victim = match self.pending.iter().find(|k| **k != keep) {
                Some(k) => *k,
                None => break,
            };
            self.pending.remove(&victim);
            self.entries.remove(&victim);
            self.evicted_total += 1;
            tracing::debug!(key = %victim, "evicted one-sided join entry");
        }
    }

    pub fn get(&self, key: &CorrelationKey) -> Option<&JoinEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_len(&self) -> usize {
        self.entries.len() - self.pending.len()
    }

    /// Current `(truth, prediction)` of every complete entry, in key order.
    pub fn completed_pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.values().filter_map(JoinEntry::pair)
    }

    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }
}

impl Default for JoinTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(ts: f64, field: Field, value: f64) -> FieldEvent {
        FieldEvent {
            key: CorrelationKey::new(ts),
            field,
            value,
            arrival_seq: 0,
        }
    }

    #[test]
    fn pair_completes_in_either_order() {
        let mut a = JoinTable::new();
        assert_eq!(a.apply(&ev(1.0, Field::Truth, 5.0)), JoinState::Pending);
        let sa = a.apply(&ev(1.0, Field::Prediction, 3.0));

        let mut b = JoinTable::new();
        assert_eq!(b.apply(&ev(1.0, Field::Prediction, 3.0)), JoinState::Pending);
        let sb = b.apply(&ev(1.0, Field::Truth, 5.0));

        assert_eq!(sa, sb);
        assert_eq!(
            sa,
            JoinState::Completed {
                truth: 5.0,
                prediction: 3.0
            }
        );
        assert_eq!(a.get(&CorrelationKey::new(1.0)), b.get(&CorrelationKey::new(1.0)));
    }

    #[test]
    fn repeated_field_overwrites_instead_of_completing() {
        let mut table = JoinTable::new();
        table.apply(&ev(1.0, Field::Truth, 5.0));
        assert_eq!(table.apply(&ev(1.0, Field::Truth, 6.0)), JoinState::Pending);

        let entry = table.get(&CorrelationKey::new(1.0)).unwrap();
        assert_eq!(entry.truth, Some(6.0));
        assert!(!entry.is_complete());
        assert_eq!(table.pending_len(), 1);
    }

    #[test]
    fn duplicate_on_complete_entry_is_unchanged() {
        let mut table = JoinTable::new();
        table.apply(&ev(1.0, Field::Truth, 5.0));
        table.apply(&ev(1.0, Field::Prediction, 3.0));
        assert_eq!(table.apply(&ev(1.0, Field::Prediction, 3.0)), JoinState::Unchanged);
        assert_eq!(table.completed_len(), 1);
    }

    #[test]
    fn changed_value_on_complete_entry_is_a_revision() {
        let mut table = JoinTable::new();
        table.apply(&ev(1.0, Field::Truth, 5.0));
        table.apply(&ev(1.0, Field::Prediction, 3.0));
        assert_eq!(
            table.apply(&ev(1.0, Field::Prediction, 4.0)),
            JoinState::Revised {
                previous: (5.0, 3.0),
                current: (5.0, 4.0)
            }
        );
    }

    #[test]
    fn completed_pairs_reflect_latest_values() {
        let mut table = JoinTable::new();
        table.apply(&ev(2.0, Field::Truth, 5.0));
        table.apply(&ev(2.0, Field::Prediction, 3.0));
        table.apply(&ev(1.0, Field::Truth, 1.0));
        table.apply(&ev(2.0, Field::Prediction, 4.0));

        assert_eq!(table.completed_pairs().collect::<Vec<_>>(), vec![(5.0, 4.0)]);
    }

    #[test]
    fn oldest_pending_keys_are_evicted_over_capacity() {
        let mut table = JoinTable::with_max_pending(Some(2));
        table.apply(&ev(1.0, Field::Truth, 1.0));
        table.apply(&ev(2.0, Field::Truth, 1.0));
        table.apply(&ev(3.0, Field::Truth, 1.0));

        assert_eq!(table.pending_len(), 2);
        assert_eq!(table.evicted_total(), 1);
        assert!(table.get(&CorrelationKey::new(1.0)).is_none());
        assert!(table.get(&CorrelationKey::new(3.0)).is_some());
    }

    #[test]
    fn late_key_is_kept_even_if_smallest() {
        let mut table = JoinTable::with_max_pending(Some(1));
        table.apply(&ev(5.0, Field::Truth, 1.0));
        table.apply(&ev(2.0, Field::Truth, 1.0));

        assert!(table.get(&CorrelationKey::new(2.0)).is_some());
        assert!(table.get(&CorrelationKey::new(5.0)).is_none());
    }

    #[test]
    fn completed_entries_are_never_evicted() {
        let mut table = JoinTable::with_max_pending(Some(1));
        table.apply(&ev(1.0, Field::Truth, 1.0));
        table.apply(&ev(1.0, Field::Prediction, 1.0));
        table.apply(&ev(2.0, Field::Truth, 1.0));
        table.apply(&ev(3.0, Field::Truth, 1.0));

        assert!(table.get(&CorrelationKey::new(1.0)).unwrap().is_complete());
        assert_eq!(table.completed_len(), 1);
        assert_eq!(table.pending_len(), 1);
    }
}
