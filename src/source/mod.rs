//! Addressable resources and bounded range readers
//!
//! A [`Resource`] knows its total length and can open a [`RangeRead`] over
//! any sub-range of itself. Range readers are budgeted: once every byte of
//! the range has been delivered they fail with an end-of-chunk error, which
//! the record queue treats as a clean end of stream.

mod http;
mod local;
mod memory;

pub use http::HttpResource;
pub use local::LocalFile;
pub use memory::MemoryResource;

use std::fmt;
use std::io::{self, Read};

use crate::error::Result;
use crate::parallel::ChunkRange;

/// A byte sequence addressable by range, local or remote
pub trait Resource: Send + Sync {
    /// Human-readable name used in logs and reports
    fn describe(&self) -> String;

    /// Total length in bytes
    fn length(&self) -> Result<u64>;

    /// Open a sequential reader positioned exactly at `range.from`
    fn open_range(&self, range: ChunkRange) -> Result<Box<dyn RangeRead>>;
}

/// Sequential reader over one chunk of a resource
pub trait RangeRead: Read + Send {
    fn range(&self) -> ChunkRange;

    /// Bytes of the range not yet delivered
    fn remaining(&self) -> u64;

    /// Release the underlying handle
    fn close(self: Box<Self>) -> io::Result<()>;
}

#[derive(Debug)]
struct EndOfChunk;

impl fmt::Display for EndOfChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("end of chunk")
    }
}

impl std::error::Error for EndOfChunk {}

/// The error a range reader returns once its budget is exhausted
pub fn end_of_chunk() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, EndOfChunk)
}

pub fn is_end_of_chunk(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<EndOfChunk>())
}

/// Pick the resource implementation for a path or URL
pub fn open_resource(locator: &str) -> Result<Box<dyn Resource>> {
    if locator.starts_with("http://") || locator.starts_with("https://") {
        Ok(Box::new(HttpResource::new(locator)))
    } else {
        Ok(Box::new(LocalFile::new(locator)))
    }
}

/// Remaining-byte budget shared by the range reader variants
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    range: ChunkRange,
    remaining: u64,
}

impl Budget {
    pub(crate) fn new(range: ChunkRange) -> Self {
        Self {
            range,
            remaining: range.len(),
        }
    }

    pub(crate) fn range(&self) -> ChunkRange {
        self.range
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    /// How many bytes of a `wanted`-sized buffer the next read may fill
    pub(crate) fn limit(&self, wanted: usize) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(end_of_chunk());
        }
        Ok(wanted.min(usize::try_from(self.remaining).unwrap_or(usize::MAX)))
    }

    pub(crate) fn consume(&mut self, n: usize) {
        self.remaining = self.remaining.saturating_sub(n as u64);
    }
}
