//! Thread-safe run state shared between the orchestrator and its workers
//!
//! Contains the abort flag polled by every production thread and the
//! per-chunk byte counters an external status renderer can poll.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Run-wide stop flag, raised by the orchestrator on the first fatal error
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bytes consumed so far by one chunk's production thread
#[derive(Debug, Clone, Default)]
pub struct ChunkProgress(Arc<AtomicU64>);

impl ChunkProgress {
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-chunk progress counters for the current run.
///
/// Purely observational: nothing in the scan reads these back.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    chunks: Arc<Mutex<Vec<ChunkProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the tracker to `chunks` zeroed counters and return them in chunk order
    pub(crate) fn prepare(&self, chunks: usize) -> Vec<ChunkProgress> {
        let fresh: Vec<ChunkProgress> = (0..chunks).map(|_| ChunkProgress::default()).collect();
        let mut slots = self.chunks.lock().unwrap_or_else(PoisonError::into_inner);
        *slots = fresh.clone();
        fresh
    }

    /// Bytes consumed per chunk, in chunk order
    pub fn snapshot(&self) -> Vec<u64> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ChunkProgress::get)
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.snapshot().iter().sum()
    }
}
