//! Channel-backed record queue
//!
//! A [`RecordQueue`] owns one background thread that reads a byte source,
//! cuts it into delimiter-terminated records and pushes them onto a bounded
//! channel. The consuming side sees the same ordered stream through two
//! protocols: [`RecordQueue::next_record`] hands out whole records and the
//! [`Read`] impl streams their bytes. Both advance one shared cursor, so they
//! can be mixed freely without losing or repeating a byte.
//!
//! When the source ends, whatever follows the last delimiter is kept as the
//! trailing partial and reported by [`RecordQueue::finish`].

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::warn;
use std::fmt;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use crate::parallel::{
    AbortSignal, ChunkProgress, DEFAULT_BUFFER_SIZE, DEFAULT_DELIMITER, DEFAULT_QUEUE_DEPTH,
};
use crate::source::is_end_of_chunk;

/// Zero-byte reads tolerated in a row before the source counts as stalled
pub const MAX_CONSECUTIVE_EMPTY_READS: usize = 64;

#[derive(Debug)]
struct ScanAborted;

impl fmt::Display for ScanAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scan aborted")
    }
}

impl std::error::Error for ScanAborted {}

/// Terminal error recorded when the abort signal stops production.
///
/// Its kind is `Other`, never `Interrupted`: std readers retry `Interrupted`
/// and would spin on a stream that reports it forever.
fn scan_aborted() -> io::Error {
    io::Error::new(io::ErrorKind::Other, ScanAborted)
}

pub fn is_scan_aborted(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<ScanAborted>())
}

/// Settings for one record queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub delimiter: u8,
    /// Scratch buffer size for each read
    pub buffer_size: usize,
    /// Completed records buffered before the producer blocks
    pub queue_depth: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

/// Optional observers for the production thread
#[derive(Debug, Clone, Default)]
pub struct QueueHooks {
    /// Incremented with every byte read from the source
    pub progress: Option<ChunkProgress>,
    /// Checked before every read; a raised signal ends the stream
    pub abort: Option<AbortSignal>,
}

enum QueueMessage {
    Record(Vec<u8>),
    End(QueueEnd),
}

struct QueueEnd {
    trailing: Vec<u8>,
    terminal: Option<io::Error>,
    bytes_read: u64,
    empty_reads: u64,
}

impl QueueEnd {
    /// Stand-in for an end marker the producer never sent
    fn lost() -> Self {
        Self {
            trailing: Vec::new(),
            terminal: Some(io::Error::new(
                io::ErrorKind::Other,
                "record producer terminated without an end marker",
            )),
            bytes_read: 0,
            empty_reads: 0,
        }
    }
}

/// Everything a queue reports once its stream has ended
#[derive(Debug)]
pub struct QueueOutcome<R> {
    /// The source, handed back so the caller can close it
    pub source: R,
    /// Bytes after the last delimiter
    pub trailing: Vec<u8>,
    /// Why production stopped; `None` for a clean end
    pub terminal: Option<io::Error>,
    pub bytes_read: u64,
    pub empty_reads: u64,
    /// Records dequeued through either protocol
    pub records: u64,
    /// Records still queued when `finish` was called
    pub unread: Vec<Vec<u8>>,
}

/// Ordered queue of delimiter-terminated records read from a background thread
pub struct RecordQueue<R> {
    receiver: Receiver<QueueMessage>,
    head: Vec<u8>,
    cursor: usize,
    end: Option<QueueEnd>,
    records: u64,
    handle: JoinHandle<R>,
}

impl<R: Read + Send + 'static> RecordQueue<R> {
    pub fn spawn(source: R, config: QueueConfig) -> Self {
        Self::spawn_with_hooks(source, config, QueueHooks::default())
    }

    pub fn spawn_with_hooks(source: R, config: QueueConfig, hooks: QueueHooks) -> Self {
        let (sender, receiver) = bounded(config.queue_depth.max(1));
        let handle = thread::spawn(move || produce_records(source, config, sender, hooks));

        Self {
            receiver,
            head: Vec::new(),
            cursor: 0,
            end: None,
            records: 0,
            handle,
        }
    }
}

impl<R> RecordQueue<R> {
    /// Block until the next record is available; `None` once the stream has ended.
    ///
    /// If the head record was partly consumed through `Read`, only its
    /// unread bytes are returned.
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        if !self.fill_head(true) {
            return None;
        }
        let head = std::mem::take(&mut self.head);
        let cursor = std::mem::replace(&mut self.cursor, 0);
        if cursor == 0 {
            Some(head)
        } else {
            Some(head[cursor..].to_vec())
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end.is_some() && self.cursor >= self.head.len()
    }

    /// Unterminated remainder, known once the end marker has been reached
    pub fn trailing_partial(&self) -> Option<&[u8]> {
        self.end.as_ref().map(|end| end.trailing.as_slice())
    }

    pub fn records_dequeued(&self) -> u64 {
        self.records
    }

    /// Ensure `head` holds unread bytes. Returns false at end of stream, or
    /// when not blocking and nothing is queued yet.
    fn fill_head(&mut self, block: bool) -> bool {
        while self.cursor >= self.head.len() {
            if self.end.is_some() {
                return false;
            }
            let message = if block {
                self.receiver.recv().ok()
            } else {
                match self.receiver.try_recv() {
                    Ok(message) => Some(message),
                    Err(TryRecvError::Empty) => return false,
                    Err(TryRecvError::Disconnected) => None,
                }
            };
            match message {
                Some(QueueMessage::Record(record)) => {
                    self.head = record;
                    self.cursor = 0;
                    self.records += 1;
                }
                Some(QueueMessage::End(end)) => {
                    self.end = Some(end);
                    return false;
                }
                None => {
                    self.end = Some(QueueEnd::lost());
                    return false;
                }
            }
        }
        true
    }

    /// Copy of the terminal error for the `Read` protocol; `None` for a clean end
    fn terminal_error(&self) -> Option<io::Error> {
        self.end
            .as_ref()
            .and_then(|end| end.terminal.as_ref())
            .map(|err| {
                if is_scan_aborted(err) {
                    scan_aborted()
                } else {
                    io::Error::new(err.kind(), err.to_string())
                }
            })
    }

    /// Stop consuming without draining: drop the receiver so the producer
    /// quits at its next send, then join it and hand back the source
    pub fn abandon(self) -> io::Result<R> {
        let RecordQueue {
            receiver, handle, ..
        } = self;
        drop(receiver);
        handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "record producer thread panicked"))
    }

    /// Drain the stream, join the producer and hand back its results
    pub fn finish(mut self) -> io::Result<QueueOutcome<R>> {
        let mut unread = Vec::new();
        while let Some(record) = self.next_record() {
            unread.push(record);
        }
        let RecordQueue {
            receiver,
            end,
            records,
            handle,
            ..
        } = self;
        drop(receiver);

        let source = handle.join().map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "record producer thread panicked")
        })?;
        let end = end.unwrap_or_else(QueueEnd::lost);

        Ok(QueueOutcome {
            source,
            trailing: end.trailing,
            terminal: end.terminal,
            bytes_read: end.bytes_read,
            empty_reads: end.empty_reads,
            records: records - unread.len() as u64,
            unread,
        })
    }
}

impl<R> Read for RecordQueue<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        while written < buf.len() {
            // Only block while nothing has been copied yet
            if !self.fill_head(written == 0) {
                break;
            }
            let available = &self.head[self.cursor..];
            let n = available.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&available[..n]);
            self.cursor += n;
            written += n;
        }

        if written == 0 {
            if let Some(err) = self.terminal_error() {
                return Err(err);
            }
        }
        Ok(written)
    }
}

impl<R> Iterator for RecordQueue<R> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// Production thread body; returns the source once the end marker is sent
fn produce_records<R: Read>(
    mut source: R,
    config: QueueConfig,
    sender: Sender<QueueMessage>,
    hooks: QueueHooks,
) -> R {
    let mut scratch = vec![0u8; config.buffer_size.max(1)];
    let mut pending = Vec::new();
    let mut bytes_read = 0u64;
    let mut empty_reads = 0u64;
    let mut consecutive_empty = 0usize;

    let terminal = loop {
        if hooks.abort.as_ref().is_some_and(AbortSignal::is_raised) {
            break Some(scan_aborted());
        }

        match source.read(&mut scratch) {
            Ok(0) => {
                empty_reads += 1;
                consecutive_empty += 1;
                if consecutive_empty >= MAX_CONSECUTIVE_EMPTY_READS {
                    warn!(
                        "source stalled: {} consecutive empty reads after {} bytes",
                        consecutive_empty, bytes_read
                    );
                    break Some(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source stalled after {} bytes", bytes_read),
                    ));
                }
                warn!("read returned no bytes after {} bytes, retrying", bytes_read);
                thread::yield_now();
            }
            Ok(n) => {
                consecutive_empty = 0;
                bytes_read += n as u64;
                if let Some(progress) = &hooks.progress {
                    progress.add(n as u64);
                }
                if !split_records(&scratch[..n], config.delimiter, &mut pending, &sender) {
                    // Consumer went away; nobody is left to read the end marker
                    return source;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if is_end_of_chunk(&e) => break None,
            Err(e) => break Some(e),
        }
    };

    let _ = sender.send(QueueMessage::End(QueueEnd {
        trailing: pending,
        terminal,
        bytes_read,
        empty_reads,
    }));
    source
}

/// Push every record completed by `data`; keeps the unterminated tail in `pending`.
/// Returns false if the receiving side has been dropped.
fn split_records(
    mut data: &[u8],
    delimiter: u8,
    pending: &mut Vec<u8>,
    sender: &Sender<QueueMessage>,
) -> bool {
    while let Some(offset) = data.iter().position(|&b| b == delimiter) {
        let (tail, rest) = data.split_at(offset + 1);
        let mut record = std::mem::take(pending);
        record.extend_from_slice(tail);
        if sender.send(QueueMessage::Record(record)).is_err() {
            return false;
        }
        data = rest;
    }
    pending.extend_from_slice(data);
    true
}
