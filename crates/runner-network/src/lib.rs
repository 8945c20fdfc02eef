//! Runner Network: HTTP client for the build-coordination protocol
//!
//! Implements [`runner_common::Network`] on top of `reqwest`:
//! - `cache`: transport handles shared per (server URL, trust root)
//! - `classify`: HTTP status to per-operation outcome tables
//! - `client`: job polling, runner lifecycle, job state reporting
//! - `trace`: range-addressed incremental trace upload
//! - `artifacts`: artifacts archive upload and download
//!
//! No operation retries. Each returns a closed outcome enum and the caller
//! decides whether and when to try again.

pub mod artifacts;
pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod trace;

pub use cache::{ClientKey, ConnectionCache};
pub use classify::{Exchange, ResponseClass};
pub use client::{CoordinatorClient, JOB_TOKEN_HEADER, VERIFY_SENTINEL_JOB_ID};
pub use config::ClientConfig;
pub use error::{NetworkError, Result};
pub use telemetry::init_tracing;
pub use trace::JOB_STATUS_HEADER;

pub use runner_common::{
    DownloadState, JobCredentials, JobDescriptor, JobPoll, JobState, Network, PatchState,
    RegisteredRunner, RemoteRange, RunnerConfig, RunnerCredentials, TraceError, TracePatch,
    UpdateState, UploadState,
};
