//! Boundary reassembly
//!
//! Records cut by chunk boundaries are resolved once, after the join, by
//! re-scanning every chunk's leading and trailing partials in range order.

use log::debug;

use crate::consumer::RecordConsumer;
use crate::error::{ProfileError, Result};
use crate::histogram::Histogram;
use crate::record_queue::RecordQueue;
use crate::source::{MemoryResource, Resource};

use super::types::{ChunkRange, ScanConfig, WorkerResult};
use super::worker::count_records;

/// Histogram of the records recovered from chunk boundaries
#[derive(Debug, Clone)]
pub struct BoundaryResult {
    pub histogram: Histogram,
    /// Records counted, including any dropped over the ceiling
    pub records: u64,
    /// Length of the reassembled byte sequence
    pub bytes: u64,
}

/// Concatenate `leading(0), trailing(0), ..., leading(n-1), trailing(n-1)` and
/// count the records in it with a fresh queue and `consumer`.
///
/// `results` must be in chunk order.
pub fn reassemble(
    results: &[WorkerResult],
    consumer: &dyn RecordConsumer,
    config: &ScanConfig,
) -> Result<BoundaryResult> {
    let mut boundary = Vec::new();
    for (position, result) in results.iter().enumerate() {
        if result.range.index != position {
            return Err(ProfileError::configuration(
                "ranges",
                format!("result for {} arrived at position {}", result.range, position),
            ));
        }
        boundary.extend_from_slice(&result.leading);
        boundary.extend_from_slice(&result.trailing);
    }
    debug!(
        "reassembling {} boundary bytes from {} chunks",
        boundary.len(),
        results.len()
    );

    let bytes = boundary.len() as u64;
    let resource = MemoryResource::new(boundary).with_name("<boundaries>");
    let range = ChunkRange::new(0, 0, bytes);
    let reader = resource.open_range(range)?;
    let mut queue = RecordQueue::spawn(reader, config.queue_config());

    let mut histogram = Histogram::new(config.max_fields);
    if let Err(e) = count_records(&mut queue, consumer, &mut histogram) {
        if let Err(close) = queue.abandon().and_then(|source| source.close()) {
            debug!("boundary queue close after consumer failure: {}", close);
        }
        return Err(e);
    }

    let outcome = queue.finish()?;
    outcome.source.close()?;
    if let Some(terminal) = outcome.terminal {
        return Err(ProfileError::Io(terminal));
    }

    // The resource's final record need not end with a delimiter
    if let Some(fields) = consumer.field_count(&outcome.trailing)? {
        histogram.record(fields);
    }

    let records = histogram.total() + histogram.overflow();
    debug!("boundary records: {}", records);
    Ok(BoundaryResult {
        histogram,
        records,
        bytes,
    })
}
