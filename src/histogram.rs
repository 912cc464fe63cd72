//! Field-count histogram

use log::{debug, warn};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Occurrence counts indexed by field count, bounded by a ceiling.
///
/// Counts at or beyond the ceiling are dropped and tallied in `overflow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
    overflow: u64,
}

impl Histogram {
    pub fn new(max_fields: usize) -> Self {
        Self {
            counts: vec![0; max_fields],
            overflow: 0,
        }
    }

    /// Exclusive upper bound on tracked field counts
    pub fn ceiling(&self) -> usize {
        self.counts.len()
    }

    /// Count one record; returns false if it was dropped for exceeding the ceiling
    pub fn record(&mut self, fields: usize) -> bool {
        self.add(fields, 1)
    }

    fn add(&mut self, fields: usize, occurrences: u64) -> bool {
        match self.counts.get_mut(fields) {
            Some(slot) => {
                *slot += occurrences;
                true
            }
            None => {
                if self.overflow == 0 {
                    warn!(
                        "record with {} fields exceeds the ceiling of {}; dropping",
                        fields,
                        self.ceiling()
                    );
                } else {
                    debug!("dropping record with {} fields", fields);
                }
                self.overflow += occurrences;
                false
            }
        }
    }

    /// Index-wise sum of `other` into `self`
    pub fn merge(&mut self, other: &Histogram) {
        for (fields, count) in other.iter() {
            self.add(fields, count);
        }
        self.overflow += other.overflow;
    }

    pub fn get(&self, fields: usize) -> u64 {
        self.counts.get(fields).copied().unwrap_or(0)
    }

    /// Records counted, excluding dropped ones
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Records dropped for exceeding the ceiling
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0 && self.overflow == 0
    }

    /// Non-zero entries in ascending field-count order
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(fields, &count)| (fields, count))
    }

    pub fn to_map(&self) -> BTreeMap<usize, u64> {
        self.iter().collect()
    }
}

struct Counts<'a>(&'a Histogram);

impl Serialize for Counts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (fields, count) in self.0.iter() {
            map.serialize_entry(&fields.to_string(), &count)?;
        }
        map.end()
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Histogram", 2)?;
        state.serialize_field("counts", &Counts(self))?;
        state.serialize_field("overflow", &self.overflow)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_iterate() {
        let mut histogram = Histogram::new(10);
        histogram.record(3);
        histogram.record(4);
        histogram.record(3);

        assert_eq!(histogram.get(3), 2);
        assert_eq!(histogram.get(4), 1);
        assert_eq!(histogram.total(), 3);
        assert_eq!(histogram.iter().collect::<Vec<_>>(), vec![(3, 2), (4, 1)]);
    }

    #[test]
    fn test_overflow_is_dropped_not_fatal() {
        let mut histogram = Histogram::new(5);
        assert!(histogram.record(4));
        assert!(!histogram.record(5));
        assert!(!histogram.record(500));
        assert_eq!(histogram.total(), 1);
        assert_eq!(histogram.overflow(), 2);
        assert_eq!(histogram.get(500), 0);
    }

    #[test]
    fn test_merge_sums_index_wise() {
        let mut left = Histogram::new(8);
        left.record(1);
        left.record(2);
        let mut right = Histogram::new(8);
        right.record(2);
        right.record(7);
        right.record(9);

        left.merge(&right);
        assert_eq!(left.to_map(), BTreeMap::from([(1, 1), (2, 2), (7, 1)]));
        assert_eq!(left.overflow(), 1);
    }

    #[test]
    fn test_merge_into_smaller_ceiling_drops_excess() {
        let mut narrow = Histogram::new(3);
        let mut wide = Histogram::new(10);
        wide.record(2);
        wide.record(6);
        narrow.merge(&wide);
        assert_eq!(narrow.to_map(), BTreeMap::from([(2, 1)]));
        assert_eq!(narrow.overflow(), 1);
    }

    #[test]
    fn test_serializes_non_zero_entries() {
        let mut histogram = Histogram::new(6);
        histogram.record(3);
        histogram.record(3);
        histogram.record(4);
        let json = serde_json::to_value(&histogram).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"counts": {"3": 2, "4": 1}, "overflow": 0})
        );
    }

    #[test]
    fn test_empty_histogram() {
        let histogram = Histogram::new(4);
        assert!(histogram.is_empty());
        assert_eq!(histogram.iter().count(), 0);
    }
}
