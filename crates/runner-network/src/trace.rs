//! Incremental trace upload
//!
//! Sends the unsent tail of a `TracePatch` as one `PATCH jobs/<id>/trace`.
//! The patch window goes in `Content-Range` with an inclusive end. A 416
//! answer carries the range the server already holds in a `Range` header;
//! it is handed back to the caller as `RangeMismatch` and nothing is resent
//! here.

use crate::cache::ClientKey;
use crate::classify::{self, Exchange};
use crate::client::{CoordinatorClient, JOB_TOKEN_HEADER};
use reqwest::header::{HeaderMap, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::Method;
use runner_common::{JobCredentials, PatchState, RemoteRange, TracePatch};
use tracing::{debug, info, warn};

/// Response header the server uses to flag the job state
pub const JOB_STATUS_HEADER: &str = "job-status";

impl CoordinatorClient {
    pub(crate) async fn send_trace_patch(
        &self,
        job: &JobCredentials,
        patch: &TracePatch,
    ) -> runner_common::Result<PatchState> {
        // Empty or inverted windows are caller errors and never reach the server
        let content_range = patch.content_range()?;
        let job_id = job.id;
        let (offset, limit) = (patch.offset(), patch.limit());

        let request = match ClientKey::try_from(job) {
            Ok(key) => {
                self.request(&key, Method::PATCH, &format!("jobs/{job_id}/trace"))
                    .await
            }
            Err(err) => Err(err),
        };
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                warn!(job_id, error = %err, "Appending trace to coordinator failed");
                return Ok(classify::patch_state(Exchange::from(&err), None, false));
            }
        };

        let response = request
            .header(JOB_TOKEN_HEADER, job.token.as_str())
            .header(CONTENT_RANGE, content_range)
            .header(CONTENT_TYPE, "text/plain")
            .body(patch.patch().to_vec())
            .send()
            .await;

        let state = match response {
            Ok(response) => {
                let headers = response.headers();
                classify::patch_state(
                    Exchange::from_status(response.status()),
                    remote_range(headers),
                    job_cancelled(headers),
                )
            }
            Err(err) => {
                warn!(job_id, offset, limit, error = %err, "Appending trace to coordinator failed");
                PatchState::Failed
            }
        };

        match state {
            PatchState::Succeeded => {
                info!(job_id, offset, limit, "Appending trace to coordinator... ok")
            }
            PatchState::RangeMismatch(range) => {
                warn!(job_id, offset, limit, remote = %range, "Appending trace to coordinator... range mismatch")
            }
            PatchState::Failed => {
                warn!(job_id, offset, limit, "Appending trace to coordinator... failed")
            }
            PatchState::Abort | PatchState::NotFound => {
                debug!(job_id, ?state, "Appending trace to coordinator... job no longer accepts trace")
            }
        }

        Ok(state)
    }
}

fn remote_range(headers: &HeaderMap) -> Option<RemoteRange> {
    let value = headers.get(RANGE)?.to_str().ok()?;
    match value.parse() {
        Ok(range) => Some(range),
        Err(err) => {
            warn!(error = %err, "Ignoring unusable Range header");
            None
        }
    }
}

fn job_cancelled(headers: &HeaderMap) -> bool {
    headers
        .get(JOB_STATUS_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|status| status.trim().eq_ignore_ascii_case("canceled"))
}
