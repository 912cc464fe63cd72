use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

/// Statistics collected while profiling
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStats {
    pub bytes_read: u64,
    /// Records counted into a chunk's own histogram
    pub records: u64,
    /// Records recovered by boundary reassembly
    pub boundary_records: u64,
    pub chunks: usize,
    pub empty_reads: u64,
    pub overflowed: u64,
    #[serde(rename = "processing_time_ms", serialize_with = "serialize_millis")]
    pub processing_time: Duration,
    #[serde(skip)]
    pub start_time: Option<Instant>,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn finish_processing(&mut self) {
        if let Some(start) = self.start_time {
            self.processing_time = start.elapsed();
        }
    }

    /// Fold one worker's counters into these totals
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.bytes_read += other.bytes_read;
        self.records += other.records;
        self.boundary_records += other.boundary_records;
        self.chunks += other.chunks;
        self.empty_reads += other.empty_reads;
        self.overflowed += other.overflowed;
    }

    pub fn total_records(&self) -> u64 {
        self.records + self.boundary_records
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Records profiled: {} total, {} at chunk boundaries; {} chunks, {} bytes",
            self.total_records(),
            self.boundary_records,
            self.chunks,
            self.bytes_read
        );

        let processing_time_ms = self.processing_time.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.bytes_read > 0 {
            let mb_per_sec =
                (self.bytes_read as f64 / (1024.0 * 1024.0)) * 1000.0 / processing_time_ms as f64;
            output.push_str(&format!(" ({:.1} MB/s)", mb_per_sec));
        }

        if self.overflowed > 0 {
            output.push_str(&format!(", {} dropped over field ceiling", self.overflowed));
        }

        if self.empty_reads > 0 {
            output.push_str(&format!(", {} empty reads retried", self.empty_reads));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_worker_stats() {
        let mut total = ProcessingStats::default();
        let worker = ProcessingStats {
            bytes_read: 100,
            records: 7,
            chunks: 1,
            empty_reads: 2,
            ..Default::default()
        };
        total.merge(&worker);
        total.merge(&worker);
        assert_eq!(total.bytes_read, 200);
        assert_eq!(total.records, 14);
        assert_eq!(total.chunks, 2);
        assert_eq!(total.empty_reads, 4);
    }

    #[test]
    fn test_format_stats_mentions_warnings_only_when_present() {
        let mut stats = ProcessingStats {
            bytes_read: 27,
            records: 1,
            boundary_records: 2,
            chunks: 2,
            ..Default::default()
        };
        let line = stats.format_stats();
        assert!(line.starts_with(
            "Records profiled: 3 total, 2 at chunk boundaries; 2 chunks, 27 bytes"
        ));
        assert!(!line.contains("dropped"));

        stats.overflowed = 4;
        assert!(stats.format_stats().contains("4 dropped over field ceiling"));
    }

    #[test]
    fn test_serializes_time_in_millis() {
        let stats = ProcessingStats {
            processing_time: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["processing_time_ms"], 1500);
        assert!(json.get("start_time").is_none());
    }
}
