//! Response classification
//!
//! Every operation sends one request and maps what came back onto its own
//! outcome enum. The mapping is split in two pure steps: HTTP status to
//! `ResponseClass`, then `Exchange` (response, configuration error, or no
//! response at all) to the per-operation state.

use crate::error::NetworkError;
use reqwest::StatusCode;
use runner_common::{DownloadState, PatchState, RemoteRange, UpdateState, UploadState};

/// Protocol meaning of an HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx
    Success,
    /// 403: credentials or token rejected
    Forbidden,
    /// 404: resource or job absent
    NotFound,
    /// 413
    PayloadTooLarge,
    /// 416: carries a corrective `Range` header
    RangeNotSatisfiable,
    /// Anything the protocol does not name
    Unexpected(StatusCode),
}

impl ResponseClass {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => ResponseClass::Success,
            StatusCode::FORBIDDEN => ResponseClass::Forbidden,
            StatusCode::NOT_FOUND => ResponseClass::NotFound,
            StatusCode::PAYLOAD_TOO_LARGE => ResponseClass::PayloadTooLarge,
            StatusCode::RANGE_NOT_SATISFIABLE => ResponseClass::RangeNotSatisfiable,
            other => ResponseClass::Unexpected(other),
        }
    }
}

/// What a single request produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// The server answered
    Answered(ResponseClass),
    /// The request was never sent: bad URL or trust root
    Misconfigured,
    /// No response: connect error, timeout, reset
    Unreachable,
}

impl Exchange {
    pub fn from_status(status: StatusCode) -> Self {
        Exchange::Answered(ResponseClass::from_status(status))
    }
}

impl From<&NetworkError> for Exchange {
    fn from(err: &NetworkError) -> Self {
        if err.is_config() {
            Exchange::Misconfigured
        } else {
            Exchange::Unreachable
        }
    }
}

/// Runner deletion succeeds only on explicit success
pub fn delete_succeeded(exchange: Exchange) -> bool {
    matches!(exchange, Exchange::Answered(ResponseClass::Success))
}

/// Runner verification
///
/// Probes a job id that never exists, so 404 means the token authenticated.
/// Only an explicit 403 or a request that never got an answer counts as
/// invalid; every other answer is taken as valid.
pub fn runner_is_valid(exchange: Exchange) -> bool {
    match exchange {
        Exchange::Answered(ResponseClass::NotFound) => true,
        Exchange::Answered(ResponseClass::Forbidden) => false,
        Exchange::Answered(_) => true,
        Exchange::Misconfigured | Exchange::Unreachable => false,
    }
}

/// Job state update
pub fn update_state(exchange: Exchange) -> UpdateState {
    match exchange {
        Exchange::Answered(ResponseClass::Success) => UpdateState::Succeeded,
        Exchange::Answered(ResponseClass::Forbidden | ResponseClass::NotFound) => UpdateState::Abort,
        Exchange::Misconfigured => UpdateState::Abort,
        Exchange::Answered(_) | Exchange::Unreachable => UpdateState::Failed,
    }
}

/// Trace patch
///
/// `remote_range` is the parsed `Range` header, `cancelled` whether the
/// server flagged the job as cancelled. A 416 without a usable range gives
/// the caller nothing to resume from and counts as a failure.
pub fn patch_state(
    exchange: Exchange,
    remote_range: Option<RemoteRange>,
    cancelled: bool,
) -> PatchState {
    if cancelled {
        return PatchState::Abort;
    }

    match exchange {
        Exchange::Answered(ResponseClass::Success) => PatchState::Succeeded,
        Exchange::Answered(ResponseClass::Forbidden) => PatchState::Abort,
        Exchange::Answered(ResponseClass::NotFound) => PatchState::NotFound,
        Exchange::Answered(ResponseClass::RangeNotSatisfiable) => match remote_range {
            Some(range) => PatchState::RangeMismatch(range),
            None => PatchState::Failed,
        },
        Exchange::Misconfigured => PatchState::Abort,
        Exchange::Answered(_) | Exchange::Unreachable => PatchState::Failed,
    }
}

/// Artifacts upload
pub fn upload_state(exchange: Exchange) -> UploadState {
    match exchange {
        Exchange::Answered(ResponseClass::Success) => UploadState::Succeeded,
        Exchange::Answered(ResponseClass::PayloadTooLarge) => UploadState::TooLarge,
        Exchange::Answered(ResponseClass::Forbidden) => UploadState::Forbidden,
        Exchange::Answered(_) | Exchange::Misconfigured | Exchange::Unreachable => {
            UploadState::Failed
        }
    }
}

/// Artifacts download
pub fn download_state(exchange: Exchange) -> DownloadState {
    match exchange {
        Exchange::Answered(ResponseClass::Success) => DownloadState::Succeeded,
        Exchange::Answered(ResponseClass::Forbidden) => DownloadState::Forbidden,
        Exchange::Answered(ResponseClass::NotFound) => DownloadState::NotFound,
        Exchange::Answered(_) | Exchange::Misconfigured | Exchange::Unreachable => {
            DownloadState::Failed
        }
    }
}
