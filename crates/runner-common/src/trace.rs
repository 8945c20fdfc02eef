//! Trace patches - resumable byte ranges over a job's output
//!
//! A `TracePatch` is an immutable snapshot of the job trace plus the window
//! `[offset, limit)` that the server has not acknowledged yet. The caller owns
//! the offset: after `Succeeded` it continues from `limit()`, after a range
//! mismatch it rebuilds the patch with `resume_after()` against its current
//! buffer.
//!
//! Offsets are never clamped. When the server claims more bytes than the local
//! buffer holds (the same job ran twice and the server saw the longer trace),
//! the rebuilt patch has `offset > limit` and `validate_range()` reports it.

use crate::error::{Result, TraceError};
use std::str::FromStr;
use std::sync::Arc;

/// Unsent tail of a trace buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePatch {
    trace: Arc<[u8]>,
    offset: usize,
    limit: usize,
}

impl TracePatch {
    /// Snapshot `trace` with everything before `offset` already acknowledged
    pub fn new(trace: impl Into<Arc<[u8]>>, offset: usize) -> Self {
        let trace = trace.into();
        let limit = trace.len();
        TracePatch {
            trace,
            offset,
            limit,
        }
    }

    /// Same snapshot, different acknowledged offset
    pub fn with_offset(&self, offset: usize) -> Self {
        TracePatch {
            trace: Arc::clone(&self.trace),
            offset,
            limit: self.limit,
        }
    }

    /// Same snapshot, continuing after the range the server reported
    pub fn resume_after(&self, range: &RemoteRange) -> Self {
        self.with_offset(range.next_offset())
    }

    /// Inclusive start of the unsent region
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Exclusive end of the unsent region (snapshot length)
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Is there at least one unsent byte?
    pub fn validate_range(&self) -> bool {
        self.offset < self.limit
    }

    /// `validate_range` as an error for `?` callers
    pub fn check_range(&self) -> Result<()> {
        if self.validate_range() {
            Ok(())
        } else {
            Err(TraceError::InvalidRange {
                offset: self.offset,
                limit: self.limit,
            })
        }
    }

    /// Bytes `[offset, limit)`; empty when the range is invalid
    pub fn patch(&self) -> &[u8] {
        if self.validate_range() {
            &self.trace[self.offset..self.limit]
        } else {
            &[]
        }
    }

    /// `Content-Range` value (`<offset>-<limit - 1>`, inclusive end)
    pub fn content_range(&self) -> Result<String> {
        self.check_range()?;
        Ok(format!("{}-{}", self.offset, self.limit - 1))
    }
}

/// Range the server already holds, as sent back in a `Range` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteRange {
    pub start: usize,
    /// Inclusive end
    pub end: usize,
}

impl RemoteRange {
    /// First byte the server has not seen
    pub fn next_offset(&self) -> usize {
        self.end.saturating_add(1)
    }
}

impl FromStr for RemoteRange {
    type Err = TraceError;

    fn from_str(value: &str) -> Result<Self> {
        let malformed = || TraceError::MalformedRange(value.to_string());

        let (start, end) = value.trim().split_once('-').ok_or_else(malformed)?;
        let start = start.trim().parse().map_err(|_| malformed())?;
        let end = end.trim().parse().map_err(|_| malformed())?;

        Ok(RemoteRange { start, end })
    }
}

impl std::fmt::Display for RemoteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
