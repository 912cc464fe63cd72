use log::debug;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{Budget, RangeRead, Resource};
use crate::error::{ProfileError, Result};
use crate::parallel::ChunkRange;

/// A file on the local filesystem; each range opens its own handle
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for LocalFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn length(&self) -> Result<u64> {
        let metadata = fs::metadata(&self.path)
            .map_err(|e| ProfileError::unavailable(self.describe(), e.to_string()))?;
        if !metadata.is_file() {
            return Err(ProfileError::unavailable(
                self.describe(),
                "not a regular file",
            ));
        }
        Ok(metadata.len())
    }

    fn open_range(&self, range: ChunkRange) -> Result<Box<dyn RangeRead>> {
        let mut file = File::open(&self.path)
            .map_err(|e| ProfileError::unavailable(self.describe(), e.to_string()))?;
        let actual = file.seek(SeekFrom::Start(range.from)).map_err(|e| {
            ProfileError::unavailable(
                self.describe(),
                format!("seek to {} failed: {}", range.from, e),
            )
        })?;
        if actual != range.from {
            return Err(ProfileError::SeekFailure { range, actual });
        }
        debug!("opened {} for {}", self.describe(), range);
        Ok(Box::new(FileRange {
            file,
            budget: Budget::new(range),
        }))
    }
}

struct FileRange {
    file: File,
    budget: Budget,
}

impl Read for FileRange {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = self.budget.limit(buf.len())?;
        let n = self.file.read(&mut buf[..limit])?;
        self.budget.consume(n);
        Ok(n)
    }
}

impl RangeRead for FileRange {
    fn range(&self) -> ChunkRange {
        self.budget.range()
    }

    fn remaining(&self) -> u64 {
        self.budget.remaining()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self.file);
        Ok(())
    }
}
