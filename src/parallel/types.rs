//! Type definitions for parallel profiling
//!
//! Contains chunk ranges, the partitioning rule, scan configuration and
//! the per-worker result message.

use serde::Serialize;
use std::fmt;

use crate::error::{ProfileError, Result};
use crate::histogram::Histogram;
use crate::record_queue::QueueConfig;
use crate::stats::ProcessingStats;

pub const DEFAULT_DELIMITER: u8 = b'\n';
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;
pub const DEFAULT_MAX_FIELDS: usize = 500;

/// Half-open byte range `[from, to)` of a resource, owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkRange {
    pub index: usize,
    pub from: u64,
    pub to: u64,
}

impl ChunkRange {
    pub fn new(index: usize, from: u64, to: u64) -> Self {
        debug_assert!(from <= to, "range start after end");
        Self { index, from, to }
    }

    pub fn len(&self) -> u64 {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}[{}..{})", self.index, self.from, self.to)
    }
}

/// Split `[0, length)` into `workers` contiguous ranges.
///
/// The first `workers - 1` ranges get `length / workers` bytes each and the
/// last range absorbs whatever is left, so the sizes always sum to `length`.
/// A zero-length resource yields no ranges at all.
pub fn partition(length: u64, workers: usize) -> Vec<ChunkRange> {
    if length == 0 {
        return Vec::new();
    }
    let workers = workers.max(1);
    let split = length / workers as u64;

    let mut ranges = Vec::with_capacity(workers);
    let mut from = 0u64;
    for index in 0..workers {
        let to = if index == workers - 1 {
            length
        } else {
            from + split
        };
        ranges.push(ChunkRange::new(index, from, to));
        from = to;
    }
    ranges
}

/// Check that `ranges` are indexed in order, contiguous, and cover `[0, length)`
pub fn validate_partition(ranges: &[ChunkRange], length: u64) -> Result<()> {
    let mut expected_from = 0u64;
    for (position, range) in ranges.iter().enumerate() {
        if range.index != position {
            return Err(ProfileError::configuration(
                "ranges",
                format!("range {} is out of order at position {}", range, position),
            ));
        }
        if range.from != expected_from || range.to < range.from {
            return Err(ProfileError::configuration(
                "ranges",
                format!(
                    "range {} does not continue from offset {}",
                    range, expected_from
                ),
            ));
        }
        expected_from = range.to;
    }
    if expected_from != length {
        return Err(ProfileError::configuration(
            "ranges",
            format!(
                "ranges cover {} bytes but the resource has {}",
                expected_from, length
            ),
        ));
    }
    Ok(())
}

/// Configuration for a parallel scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanConfig {
    pub workers: usize,
    pub delimiter: u8,
    pub buffer_size: usize,
    pub queue_depth: usize,
    pub max_fields: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get() * 2,
            delimiter: DEFAULT_DELIMITER,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl ScanConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Reject settings that cannot drive a scan
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ProfileError::configuration("workers", "must be >= 1"));
        }
        if self.max_fields == 0 {
            return Err(ProfileError::configuration("max-fields", "must be >= 1"));
        }
        if self.buffer_size == 0 {
            return Err(ProfileError::configuration("buffer-size", "must be >= 1"));
        }
        if self.queue_depth == 0 {
            return Err(ProfileError::configuration("queue-depth", "must be >= 1"));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            delimiter: self.delimiter,
            buffer_size: self.buffer_size,
            queue_depth: self.queue_depth,
        }
    }
}

/// What one worker reports after its chunk is exhausted
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub range: ChunkRange,
    pub histogram: Histogram,
    /// First record dequeued, withheld from `histogram`
    pub leading: Vec<u8>,
    /// Unterminated remainder left when the source ended
    pub trailing: Vec<u8>,
    pub stats: ProcessingStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partition_remainder_goes_last() {
        let ranges = partition(10, 3);
        assert_eq!(
            ranges,
            vec![
                ChunkRange::new(0, 0, 3),
                ChunkRange::new(1, 3, 6),
                ChunkRange::new(2, 6, 10),
            ]
        );
    }

    #[test]
    fn test_partition_empty_resource() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_partition_more_workers_than_bytes() {
        let ranges = partition(3, 5);
        assert_eq!(ranges.len(), 5);
        assert!(ranges[..4].iter().all(ChunkRange::is_empty));
        assert_eq!(ranges[4], ChunkRange::new(4, 0, 3));
    }

    #[test]
    fn test_validate_partition_rejects_gap() {
        let ranges = vec![ChunkRange::new(0, 0, 4), ChunkRange::new(1, 5, 9)];
        let err = validate_partition(&ranges, 9).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_partition_rejects_short_cover() {
        let ranges = vec![ChunkRange::new(0, 0, 4)];
        assert!(validate_partition(&ranges, 9).is_err());
        assert!(validate_partition(&ranges, 4).is_ok());
    }

    #[test]
    fn test_scan_config_validation() {
        assert!(ScanConfig::default().validate().is_ok());
        assert!(ScanConfig::default().with_workers(0).validate().is_err());

        let config = ScanConfig {
            max_fields: 0,
            ..ScanConfig::default()
        };
        assert!(config.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_chunk_range_display() {
        assert_eq!(ChunkRange::new(3, 10, 20).to_string(), "#3[10..20)");
    }

    proptest! {
        #[test]
        fn prop_partition_is_exact(length in 0u64..100_000, workers in 1usize..64) {
            let ranges = partition(length, workers);
            if length == 0 {
                prop_assert!(ranges.is_empty());
            } else {
                prop_assert_eq!(ranges.len(), workers);
                prop_assert_eq!(ranges[0].from, 0);
                prop_assert_eq!(ranges[ranges.len() - 1].to, length);
                for pair in ranges.windows(2) {
                    prop_assert_eq!(pair[0].to, pair[1].from);
                }
                let total: u64 = ranges.iter().map(ChunkRange::len).sum();
                prop_assert_eq!(total, length);
                prop_assert!(validate_partition(&ranges, length).is_ok());
            }
        }
    }
}
