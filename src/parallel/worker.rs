//! Worker for parallel profiling
//!
//! Contains the per-chunk worker that drives one record queue over one
//! range reader and counts every record except the first.

use log::debug;

use crate::consumer::RecordConsumer;
use crate::error::{ProfileError, Result};
use crate::histogram::Histogram;
use crate::record_queue::{is_scan_aborted, QueueHooks, RecordQueue};
use crate::source::Resource;
use crate::stats::ProcessingStats;

use super::types::{ChunkRange, ScanConfig, WorkerResult};

/// Profile one chunk of `resource`.
///
/// The first record dequeued is withheld as the leading partial and whatever
/// follows the last delimiter becomes the trailing partial; neither is
/// counted here. Every error is returned with the chunk's range attached.
pub fn run_worker(
    resource: &dyn Resource,
    range: ChunkRange,
    consumer: &dyn RecordConsumer,
    config: &ScanConfig,
    hooks: QueueHooks,
) -> Result<WorkerResult> {
    profile_chunk(resource, range, consumer, config, hooks).map_err(|e| e.in_chunk(range))
}

/// Hand every remaining record of `queue` to `consumer`, one at a time
pub(crate) fn count_records<R>(
    queue: &mut RecordQueue<R>,
    consumer: &dyn RecordConsumer,
    histogram: &mut Histogram,
) -> Result<()> {
    while let Some(record) = queue.next_record() {
        if let Some(fields) = consumer.field_count(&record)? {
            histogram.record(fields);
        }
    }
    Ok(())
}

fn profile_chunk(
    resource: &dyn Resource,
    range: ChunkRange,
    consumer: &dyn RecordConsumer,
    config: &ScanConfig,
    hooks: QueueHooks,
) -> Result<WorkerResult> {
    let mut stats = ProcessingStats::new();

    let reader = resource.open_range(range)?;
    debug!("{} opened on {}", range, resource.describe());
    let mut queue = RecordQueue::spawn_with_hooks(reader, config.queue_config(), hooks);

    let leading = queue.next_record().unwrap_or_default();

    let mut histogram = Histogram::new(config.max_fields);
    if let Err(e) = count_records(&mut queue, consumer, &mut histogram) {
        // Report now rather than after reading the rest of the chunk
        if let Err(close) = queue.abandon().and_then(|source| source.close()) {
            debug!("{} close after consumer failure: {}", range, close);
        }
        return Err(e);
    }

    let outcome = queue.finish()?;
    outcome.source.close()?;

    if let Some(terminal) = outcome.terminal {
        if is_scan_aborted(&terminal) {
            debug!("{} stopped after {} bytes", range, outcome.bytes_read);
            return Err(ProfileError::Aborted);
        }
        return Err(ProfileError::Io(terminal));
    }

    if outcome.bytes_read != range.len() {
        return Err(ProfileError::ShortRead {
            range,
            expected: range.len(),
            actual: outcome.bytes_read,
        });
    }

    debug!(
        "{} done: {} records, leading {} bytes, trailing {} bytes",
        range,
        histogram.total(),
        leading.len(),
        outcome.trailing.len()
    );

    stats.bytes_read = outcome.bytes_read;
    stats.records = histogram.total();
    stats.overflowed = histogram.overflow();
    stats.empty_reads = outcome.empty_reads;
    stats.chunks = 1;
    stats.finish_processing();

    Ok(WorkerResult {
        range,
        histogram,
        leading,
        trailing: outcome.trailing,
        stats,
    })
}
