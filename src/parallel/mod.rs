//! Parallel profiling module for profcsv
//!
//! This module splits a resource into contiguous byte ranges, profiles each
//! range on its own thread and stitches the records cut by range boundaries
//! back together after the join.
//!
//! # Module Structure
//!
//! - `types`: Chunk ranges, partitioning, scan configuration and worker results
//! - `tracker`: Abort flag and per-chunk progress counters
//! - `worker`: Profiles one range through its own record queue
//! - `reassembly`: Re-scans the leading and trailing partials of every chunk
//! - `aggregate`: Merges chunk and boundary histograms
//! - `processor`: Main Profiler orchestration

mod aggregate;
mod processor;
mod reassembly;
mod tracker;
mod types;
mod worker;

// Re-export public types
pub use aggregate::aggregate;
pub use processor::{ProfileReport, Profiler};
pub use reassembly::{reassemble, BoundaryResult};
pub use tracker::{AbortSignal, ChunkProgress, ProgressTracker};
pub use types::{
    partition, validate_partition, ChunkRange, ScanConfig, WorkerResult, DEFAULT_BUFFER_SIZE,
    DEFAULT_DELIMITER, DEFAULT_MAX_FIELDS, DEFAULT_QUEUE_DEPTH,
};
pub use worker::run_worker;
