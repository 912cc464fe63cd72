//! Record consumers
//!
//! A consumer decides what a "field" is. The scan core hands it exactly one
//! delimiter-terminated byte span at a time and records the count it reports,
//! so a record is never merged with its neighbours whatever its contents.

use crate::error::Result;

/// Turns delimiter-terminated records into field counts
pub trait RecordConsumer: Send + Sync {
    /// Field count of one record, or `None` if the consumer sees no record in it.
    ///
    /// `record` is either terminated by the record delimiter or is the
    /// resource's final, unterminated remainder.
    fn field_count(&self, record: &[u8]) -> Result<Option<usize>>;
}

/// Record body without its delimiter, and without the `\r` of a `\r\n` pair
fn record_body(record: &[u8], record_delimiter: u8) -> &[u8] {
    let body = record.strip_suffix(&[record_delimiter]).unwrap_or(record);
    if record_delimiter == b'\n' {
        body.strip_suffix(b"\r").unwrap_or(body)
    } else {
        body
    }
}

/// RFC 4180 field counting backed by the `csv` crate.
///
/// Headers are not special and records may differ in length. Blank records
/// produce no count. A lone `\r` is field content, not a terminator.
#[derive(Debug)]
pub struct CsvConsumer {
    builder: csv::ReaderBuilder,
    record_delimiter: u8,
}

impl CsvConsumer {
    pub fn new(field_separator: u8, record_delimiter: u8) -> Self {
        Self::with_quoting(field_separator, record_delimiter, true)
    }

    pub fn with_quoting(field_separator: u8, record_delimiter: u8, quoting: bool) -> Self {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(field_separator)
            .terminator(csv::Terminator::Any(record_delimiter))
            .quoting(quoting);
        Self {
            builder,
            record_delimiter,
        }
    }
}

impl Default for CsvConsumer {
    fn default() -> Self {
        Self::new(b',', b'\n')
    }
}

impl RecordConsumer for CsvConsumer {
    fn field_count(&self, record: &[u8]) -> Result<Option<usize>> {
        let body = record_body(record, self.record_delimiter);
        if body.is_empty() {
            return Ok(None);
        }
        let mut reader = self.builder.from_reader(body);
        let mut fields = csv::ByteRecord::new();
        if reader.read_byte_record(&mut fields)? {
            Ok(Some(fields.len()))
        } else {
            Ok(None)
        }
    }
}

/// Counts separators, without any quoting rules
#[derive(Debug, Clone, Copy)]
pub struct SplitConsumer {
    field_separator: u8,
    record_delimiter: u8,
}

impl SplitConsumer {
    pub fn new(field_separator: u8, record_delimiter: u8) -> Self {
        Self {
            field_separator,
            record_delimiter,
        }
    }
}

impl RecordConsumer for SplitConsumer {
    fn field_count(&self, record: &[u8]) -> Result<Option<usize>> {
        let body = record_body(record, self.record_delimiter);
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            body.iter().filter(|&&b| b == self.field_separator).count() + 1,
        ))
    }
}
