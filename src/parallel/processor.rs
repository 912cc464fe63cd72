//! Main parallel profiler
//!
//! Contains the Profiler struct that orchestrates the fork-join scan.

use crossbeam_channel::bounded;
use log::{debug, info, warn};
use serde::Serialize;
use std::thread;

use crate::consumer::RecordConsumer;
use crate::error::{ProfileError, Result};
use crate::histogram::Histogram;
use crate::record_queue::QueueHooks;
use crate::source::Resource;
use crate::stats::ProcessingStats;

use super::aggregate::aggregate;
use super::reassembly::reassemble;
use super::tracker::{AbortSignal, ProgressTracker};
use super::types::{partition, validate_partition, ChunkRange, ScanConfig, WorkerResult};
use super::worker::run_worker;

/// Final output of one profiling run
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub source: String,
    pub length: u64,
    pub chunks: Vec<ChunkRange>,
    pub histogram: Histogram,
    /// Records recovered by boundary reassembly
    pub boundary_records: u64,
    pub stats: ProcessingStats,
}

/// Main parallel profiler
pub struct Profiler {
    config: ScanConfig,
    progress: ProgressTracker,
}

impl Profiler {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            progress: ProgressTracker::new(),
        }
    }

    /// Publish per-chunk byte counts through `tracker` during a run
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = tracker;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Profile the whole of `resource`, split evenly across the configured workers
    pub fn profile(
        &self,
        resource: &dyn Resource,
        consumer: &dyn RecordConsumer,
    ) -> Result<ProfileReport> {
        self.config.validate()?;
        let length = resource.length()?;
        let ranges = partition(length, self.config.workers);
        info!(
            "{}: {} bytes in {} chunks",
            resource.describe(),
            length,
            ranges.len()
        );
        self.run(resource, consumer, length, ranges)
    }

    /// Profile `resource` using an explicit partition.
    ///
    /// The ranges must be indexed in order, contiguous, and cover the whole
    /// resource; the configured worker count is ignored.
    pub fn profile_ranges(
        &self,
        resource: &dyn Resource,
        consumer: &dyn RecordConsumer,
        ranges: Vec<ChunkRange>,
    ) -> Result<ProfileReport> {
        self.config.validate()?;
        let length = resource.length()?;
        self.run(resource, consumer, length, ranges)
    }

    fn run(
        &self,
        resource: &dyn Resource,
        consumer: &dyn RecordConsumer,
        length: u64,
        ranges: Vec<ChunkRange>,
    ) -> Result<ProfileReport> {
        validate_partition(&ranges, length)?;
        let mut stats = ProcessingStats::new();

        let results = self.scan_chunks(resource, consumer, &ranges)?;

        let boundary = reassemble(&results, consumer, &self.config)?;
        let histogram = aggregate(&results, &boundary.histogram, self.config.max_fields);

        for result in &results {
            stats.merge(&result.stats);
        }
        stats.boundary_records = boundary.records;
        stats.overflowed += boundary.histogram.overflow();
        stats.finish_processing();

        Ok(ProfileReport {
            source: resource.describe(),
            length,
            chunks: ranges,
            histogram,
            boundary_records: boundary.records,
            stats,
        })
    }

    /// Fork one worker per range and join them all.
    ///
    /// The first fatal error raises the abort signal so the remaining chunks
    /// stop reading; every worker is still joined before returning. The
    /// error reported is the lowest-indexed one that was not caused by the
    /// abort itself.
    fn scan_chunks(
        &self,
        resource: &dyn Resource,
        consumer: &dyn RecordConsumer,
        ranges: &[ChunkRange],
    ) -> Result<Vec<WorkerResult>> {
        if ranges.is_empty() {
            return Ok(Vec::new());
        }

        let abort = AbortSignal::default();
        let progress = self.progress.prepare(ranges.len());
        let (result_sender, result_receiver) = bounded(ranges.len());
        let config = &self.config;

        let mut slots: Vec<Option<Result<WorkerResult>>> = Vec::new();
        slots.resize_with(ranges.len(), || None);

        thread::scope(|scope| {
            let handles: Vec<_> = ranges
                .iter()
                .zip(progress)
                .map(|(&range, chunk_progress)| {
                    let sender = result_sender.clone();
                    let hooks = QueueHooks {
                        progress: Some(chunk_progress),
                        abort: Some(abort.clone()),
                    };
                    scope.spawn(move || {
                        let result = run_worker(resource, range, consumer, config, hooks);
                        let _ = sender.send((range.index, result));
                    })
                })
                .collect();
            drop(result_sender);

            for (index, result) in result_receiver.iter() {
                if let Err(e) = &result {
                    if !abort.is_raised() {
                        warn!("aborting scan: {}", e);
                        abort.raise();
                    }
                }
                slots[index] = Some(result);
            }

            for (index, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    abort.raise();
                    slots[index] = Some(Err(ProfileError::WorkerPanicked(index)));
                }
            }
        });

        let mut results = Vec::with_capacity(ranges.len());
        let mut first_error = None;
        let mut abort_error = None;
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) if e.is_aborted() => {
                    abort_error.get_or_insert(e);
                }
                Some(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                None => {
                    first_error.get_or_insert(ProfileError::WorkerPanicked(index));
                }
            }
        }
        if let Some(e) = first_error.or(abort_error) {
            return Err(e);
        }

        debug!("all {} chunks joined", results.len());
        Ok(results)
    }
}
