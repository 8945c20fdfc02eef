//! Per-operation outcome enumerations
//!
//! Each protocol operation classifies its response into one of these closed
//! sets. Callers own retry policy and branch on the variant.

use crate::trace::RemoteRange;

/// Outcome of reporting job state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// Server accepted the update
    Succeeded,
    /// Job is no longer updatable; stop retrying
    Abort,
    /// Transient or unexpected failure; may retry
    Failed,
}

/// Outcome of sending a trace patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    /// The bytes `[offset, limit)` were accepted
    Succeeded,
    /// Patching is forbidden or the job was cancelled; stop retrying
    Abort,
    /// Transient or unexpected failure; the same patch may be resent
    Failed,
    /// Job is unknown to the server
    NotFound,
    /// Server holds a different range; rebuild the patch from `next_offset()`
    RangeMismatch(RemoteRange),
}

impl PatchState {
    /// Should the caller stop sending patches for this job?
    pub fn is_terminal(&self) -> bool {
        matches!(self, PatchState::Abort | PatchState::NotFound)
    }
}

/// Outcome of uploading an artifacts archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Succeeded,
    /// Archive exceeds the server limit
    TooLarge,
    /// Job token rejected
    Forbidden,
    Failed,
}

/// Outcome of downloading an artifacts archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Succeeded,
    /// Job token rejected
    Forbidden,
    /// No artifacts for this job
    NotFound,
    Failed,
}
