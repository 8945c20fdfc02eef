//! Runner Common: domain model for the CI runner coordination protocol
//!
//! Defines the values exchanged between a runner and its build-coordination
//! server, independent of the transport:
//! - RunnerCredentials / RunnerConfig / JobCredentials: who is calling
//! - JobDescriptor / JobState: what is being run
//! - TracePatch / RemoteRange: resumable trace streaming state
//! - UpdateState / PatchState / UploadState / DownloadState: closed outcome sets
//! - Network: the operations a job loop or lifecycle manager calls
//!
//! Every operation makes exactly one request and never retries; the
//! outcome enums tell the caller whether retrying can help.

pub mod credentials;
pub mod error;
pub mod job;
pub mod states;
pub mod trace;

pub use credentials::{JobCredentials, RunnerConfig, RunnerCredentials};
pub use error::{Result, TraceError};
pub use job::{JobDescriptor, JobPoll, JobState, JobVariable, RegisteredRunner};
pub use states::{DownloadState, PatchState, UpdateState, UploadState};
pub use trace::{RemoteRange, TracePatch};

use async_trait::async_trait;
use std::path::Path;

/// Runner common version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Operations of the coordination protocol
///
/// Implementations are shared across concurrent job loops and hold no
/// per-call state.
#[async_trait]
pub trait Network: Send + Sync {
    /// Ask for the next job for this runner
    async fn poll_job(&self, config: &RunnerConfig) -> JobPoll;

    /// Register a runner; `None` means the whole call must be retried
    async fn register_runner(
        &self,
        credentials: &RunnerCredentials,
        description: &str,
        tags: &[String],
    ) -> Option<RegisteredRunner>;

    /// Remove a runner; true only on explicit success
    async fn delete_runner(&self, credentials: &RunnerCredentials) -> bool;

    /// Check that the runner token is still accepted
    async fn verify_runner(&self, credentials: &RunnerCredentials) -> bool;

    /// Report job state together with the full trace
    async fn update_job(
        &self,
        config: &RunnerConfig,
        job_id: u64,
        state: JobState,
        trace: Option<&str>,
    ) -> UpdateState;

    /// Send the unsent tail of a trace
    ///
    /// Fails with `TraceError::InvalidRange` before any request when the
    /// patch has nothing valid to send.
    async fn patch_trace(&self, job: &JobCredentials, patch: &TracePatch) -> Result<PatchState>;

    /// Upload an artifacts archive from `path`
    async fn upload_artifacts(&self, job: &JobCredentials, path: &Path) -> UploadState;

    /// Download the artifacts archive of a job into `path`
    async fn download_artifacts(&self, job: &JobCredentials, path: &Path) -> DownloadState;
}
