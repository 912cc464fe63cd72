//! Error types for profiling runs.

use std::io;

use thiserror::Error;

use crate::parallel::ChunkRange;

/// Result type alias for profcsv operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Error type for profcsv operations.
///
/// Every variant is fatal for the run that produced it. Conditions that are
/// recovered locally (empty reads, histogram overflow) are logged where they
/// happen and never become a `ProfileError`.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Invalid configuration detected before any worker is launched
    #[error("Invalid parameter '{parameter}': {reason}")]
    Configuration {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// Length probe or range fetch failed
    #[error("Source unavailable '{resource}': {reason}")]
    SourceUnavailable {
        /// Display form of the resource
        resource: String,
        /// What went wrong
        reason: String,
    },

    /// The remote refused to serve a partial response for a range
    #[error("Range {range} rejected by '{resource}': HTTP status {status}")]
    RangeRejected {
        /// Display form of the resource
        resource: String,
        /// The requested range
        range: ChunkRange,
        /// Status code returned instead of 206
        status: u16,
    },

    /// Positioning a range reader did not land on the requested offset
    #[error("Seek failure for range {range}: landed at offset {actual}")]
    SeekFailure {
        /// The requested range
        range: ChunkRange,
        /// Offset actually reached
        actual: u64,
    },

    /// A chunk ended without delivering every byte of its range
    #[error("Short read for range {range}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// The chunk's range
        range: ChunkRange,
        /// Bytes the range should contain
        expected: u64,
        /// Bytes actually produced
        actual: u64,
    },

    /// A fatal error raised while a worker processed its chunk
    #[error("Chunk {range} failed: {source}")]
    Chunk {
        /// The chunk's range
        range: ChunkRange,
        /// Underlying failure
        #[source]
        source: Box<ProfileError>,
    },

    /// The chunk stopped early because another chunk failed
    #[error("Scan aborted")]
    Aborted,

    /// A worker thread panicked before reporting
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ProfileError {
    pub fn configuration(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Attach chunk context, unless the error already carries it
    pub fn in_chunk(self, range: ChunkRange) -> Self {
        match self {
            err @ ProfileError::Chunk { .. } => err,
            err => ProfileError::Chunk {
                range,
                source: Box::new(err),
            },
        }
    }

    /// Innermost error, looking through chunk context
    pub fn root(&self) -> &ProfileError {
        match self {
            ProfileError::Chunk { source, .. } => source.root(),
            err => err,
        }
    }

    /// True for chunks that only stopped because the run was aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.root(), ProfileError::Aborted)
    }

    /// Configuration errors are usage mistakes, everything else is a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), ProfileError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message() {
        let error = ProfileError::configuration("workers", "must be >= 1");
        let msg = format!("{error}");
        assert!(msg.contains("Invalid parameter 'workers'"));
        assert!(msg.contains("must be >= 1"));
        assert!(error.is_configuration());
    }

    #[test]
    fn test_seek_failure_message() {
        let error = ProfileError::SeekFailure {
            range: ChunkRange::new(2, 100, 200),
            actual: 90,
        };
        let msg = format!("{error}");
        assert!(msg.contains("#2[100..200)"));
        assert!(msg.contains("offset 90"));
    }

    #[test]
    fn test_in_chunk_wraps_once() {
        let range = ChunkRange::new(1, 0, 10);
        let error = ProfileError::unavailable("data.csv", "gone")
            .in_chunk(range)
            .in_chunk(ChunkRange::new(5, 10, 20));
        match &error {
            ProfileError::Chunk { range: r, .. } => assert_eq!(*r, range),
            other => panic!("expected chunk error, got {other:?}"),
        }
        assert!(matches!(
            error.root(),
            ProfileError::SourceUnavailable { .. }
        ));
        assert!(!error.is_configuration());
        assert!(!error.is_aborted());
        assert!(ProfileError::Aborted.in_chunk(range).is_aborted());
    }

    #[test]
    fn test_range_rejected_message() {
        let error = ProfileError::RangeRejected {
            resource: "http://host/data.csv".to_string(),
            range: ChunkRange::new(0, 0, 5),
            status: 200,
        };
        let msg = format!("{error}");
        assert!(msg.contains("HTTP status 200"));
        assert!(msg.contains("http://host/data.csv"));
    }
}
