use log::{debug, info};
use std::io::{self, Read};
use std::time::Duration;

use super::{Budget, RangeRead, Resource};
use crate::error::{ProfileError, Result};
use crate::parallel::ChunkRange;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const PARTIAL_CONTENT: u16 = 206;

/// A remote resource served by an HTTP endpoint that honours `Range`
pub struct HttpResource {
    url: String,
    agent: ureq::Agent,
}

impl HttpResource {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .build();
        Self {
            url: url.into(),
            agent,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> ProfileError {
        ProfileError::unavailable(&self.url, reason)
    }
}

impl Resource for HttpResource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn length(&self) -> Result<u64> {
        let response = self
            .agent
            .head(&self.url)
            .call()
            .map_err(|e| self.unavailable(format!("HEAD failed: {}", e)))?;
        let header = response
            .header("Content-Length")
            .ok_or_else(|| self.unavailable("response has no Content-Length"))?;
        let length = header
            .trim()
            .parse::<u64>()
            .map_err(|_| self.unavailable(format!("invalid Content-Length '{}'", header)))?;
        info!("{} reports {} bytes", self.url, length);
        Ok(length)
    }

    fn open_range(&self, range: ChunkRange) -> Result<Box<dyn RangeRead>> {
        // A zero-length range cannot be expressed as an inclusive byte range
        if range.is_empty() {
            return Ok(Box::new(HttpRange {
                body: None,
                budget: Budget::new(range),
            }));
        }

        let header = range_header(range);
        debug!("{} GET {}", range, header);
        let response = match self.agent.get(&self.url).set("Range", &header).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(ProfileError::RangeRejected {
                    resource: self.url.clone(),
                    range,
                    status,
                })
            }
            Err(e) => return Err(self.unavailable(format!("GET {} failed: {}", header, e))),
        };

        if response.status() != PARTIAL_CONTENT {
            return Err(ProfileError::RangeRejected {
                resource: self.url.clone(),
                range,
                status: response.status(),
            });
        }

        let content_range = response
            .header("Content-Range")
            .ok_or_else(|| self.unavailable(format!("no Content-Range for {}", header)))?;
        let start = parse_content_range_start(content_range).ok_or_else(|| {
            self.unavailable(format!("unparseable Content-Range '{}'", content_range))
        })?;
        if start != range.from {
            return Err(ProfileError::SeekFailure {
                range,
                actual: start,
            });
        }

        Ok(Box::new(HttpRange {
            body: Some(response.into_reader()),
            budget: Budget::new(range),
        }))
    }
}

struct HttpRange {
    body: Option<Box<dyn Read + Send + Sync + 'static>>,
    budget: Budget,
}

impl Read for HttpRange {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = self.budget.limit(buf.len())?;
        let n = match self.body.as_mut() {
            Some(body) => body.read(&mut buf[..limit])?,
            None => 0,
        };
        self.budget.consume(n);
        Ok(n)
    }
}

impl RangeRead for HttpRange {
    fn range(&self) -> ChunkRange {
        self.budget.range()
    }

    fn remaining(&self) -> u64 {
        self.budget.remaining()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self.body);
        Ok(())
    }
}

/// `Range` header value; HTTP byte ranges are inclusive at both ends
pub(crate) fn range_header(range: ChunkRange) -> String {
    format!("bytes={}-{}", range.from, range.to - 1)
}

/// First offset of a `Content-Range: bytes <first>-<last>/<total>` value
pub(crate) fn parse_content_range_start(value: &str) -> Option<u64> {
    let unit_range = value.trim().strip_prefix("bytes")?.trim_start();
    let (span, _total) = unit_range.split_once('/')?;
    let (first, _last) = span.split_once('-')?;
    first.trim().parse().ok()
}
