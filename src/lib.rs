// Core library for the profcsv field-count profiler

pub mod cli;
pub mod config;
pub mod config_file;
pub mod consumer;
pub mod error;
pub mod formatters;
pub mod histogram;
pub mod parallel;
pub mod platform;
pub mod record_queue;
pub mod source;
pub mod stats;

pub use config::ProfileConfig;
pub use consumer::{CsvConsumer, RecordConsumer, SplitConsumer};
pub use error::{ProfileError, Result};
pub use histogram::Histogram;
pub use parallel::{ChunkRange, ProfileReport, Profiler, ScanConfig};
pub use source::{open_resource, HttpResource, LocalFile, MemoryResource, Resource};

/// Profile the resource named by `config` and return the report
pub fn run_profile(config: &ProfileConfig) -> Result<ProfileReport> {
    let resource = open_resource(&config.input.source)?;
    let consumer = config.build_consumer();
    Profiler::new(config.scan.clone()).profile(resource.as_ref(), consumer.as_ref())
}
