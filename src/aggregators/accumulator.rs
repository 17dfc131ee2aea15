use std::collections::HashMap;

use crate::aggregators::interval::IntervalKey;

/// In-memory grouping store: (interval, label) -> values in arrival order.
///
/// Every interval a record lands in is remembered, even when none of that
/// record's measurements produced a value, so the reduction step emits a row
/// for it with no-data markers.
#[derive(Debug, Default, Clone)]
pub struct GroupAccumulator {
    intervals: HashMap<IntervalKey, HashMap<String, Vec<f64>>>,
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the group for (interval_key, label)
    pub fn push(&mut self, interval_key: IntervalKey, label: &str, value: f64) {
        let labels = self.intervals.entry(interval_key).or_default();
        match labels.get_mut(label) {
            Some(values) => values.push(value),
            None => {
                labels.insert(label.to_string(), vec![value]);
            }
        }
    }

    /// Records an interval as seen without adding a value to it
    pub fn observe(&mut self, interval_key: IntervalKey) {
        self.intervals.entry(interval_key).or_default();
    }

    /// Every distinct interval observed so far, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = IntervalKey> + '_ {
        self.intervals.keys().copied()
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Values accumulated for (interval_key, label), empty if none were pushed
    pub fn values_for(&self, interval_key: IntervalKey, label: &str) -> &[f64] {
        self.intervals
            .get(&interval_key)
            .and_then(|labels| labels.get(label))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Folds another accumulator into this one.
    ///
    /// Groups sharing a key are concatenated, `other`'s values after ours.
    pub fn merge(&mut self, other: GroupAccumulator) {
        for (interval_key, labels) in other.intervals {
            let target = self.intervals.entry(interval_key).or_default();
            for (label, mut values) in labels {
                target.entry(label).or_default().append(&mut values);
            }
        }
    }

    /// Number of populated (interval, label) groups
    pub fn len(&self) -> usize {
        self.intervals.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
