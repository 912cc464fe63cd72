use std::io::{self, Read};
use std::sync::Arc;

use super::{Budget, RangeRead, Resource};
use crate::error::{ProfileError, Result};
use crate::parallel::ChunkRange;

/// An in-memory resource, used for boundary reassembly and tests
#[derive(Debug, Clone)]
pub struct MemoryResource {
    name: String,
    data: Arc<[u8]>,
}

impl MemoryResource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: "<memory>".to_string(),
            data: Arc::from(data.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Resource for MemoryResource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn length(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn open_range(&self, range: ChunkRange) -> Result<Box<dyn RangeRead>> {
        if range.to > self.data.len() as u64 {
            return Err(ProfileError::unavailable(
                self.describe(),
                format!("range {} exceeds {} bytes", range, self.data.len()),
            ));
        }
        Ok(Box::new(MemoryRange {
            data: Arc::clone(&self.data),
            position: range.from as usize,
            budget: Budget::new(range),
        }))
    }
}

struct MemoryRange {
    data: Arc<[u8]>,
    position: usize,
    budget: Budget,
}

impl Read for MemoryRange {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = self.budget.limit(buf.len())?;
        let end = self.position + limit;
        buf[..limit].copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        self.budget.consume(limit);
        Ok(limit)
    }
}

impl RangeRead for MemoryRange {
    fn range(&self) -> ChunkRange {
        self.budget.range()
    }

    fn remaining(&self) -> u64 {
        self.budget.remaining()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::is_end_of_chunk;

    #[test]
    fn test_reads_exact_range() {
        let resource = MemoryResource::new(b"hello,world\n".to_vec());
        let mut reader = resource.open_range(ChunkRange::new(0, 6, 11)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 2];
        loop {
            match reader.read(&mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) => {
                    assert!(is_end_of_chunk(&e));
                    break;
                }
            }
        }
        assert_eq!(out, b"world");
    }

    #[test]
    fn test_out_of_bounds_range_is_rejected() {
        let resource = MemoryResource::new(b"abc".to_vec()).with_name("tiny");
        let err = resource
            .open_range(ChunkRange::new(0, 0, 10))
            .err()
            .expect("range past the end must fail");
        assert!(err.to_string().contains("tiny"));
    }
}
