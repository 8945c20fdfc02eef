//! Artifacts archive transfer
//!
//! Both directions authenticate with the job token in a header only.

use crate::cache::ClientKey;
use crate::classify::{self, Exchange, ResponseClass};
use crate::client::{CoordinatorClient, JOB_TOKEN_HEADER};
use crate::error::Result;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method, RequestBuilder, Response};
use runner_common::{DownloadState, JobCredentials, UploadState};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// Multipart field holding the archive
pub const ARTIFACTS_FIELD: &str = "file";

impl CoordinatorClient {
    async fn artifacts_request(&self, job: &JobCredentials, method: Method) -> Result<RequestBuilder> {
        let key = ClientKey::try_from(job)?;
        let request = self
            .request(&key, method, &format!("jobs/{}/artifacts", job.id))
            .await?;
        Ok(request.header(JOB_TOKEN_HEADER, job.token.as_str()))
    }

    pub(crate) async fn send_artifacts(&self, job: &JobCredentials, path: &Path) -> UploadState {
        let job_id = job.id;

        let part = match archive_part(path).await {
            Ok(part) => part,
            Err(err) => {
                error!(job_id, path = %path.display(), error = %err, "Cannot read artifacts archive");
                return UploadState::Failed;
            }
        };
        let form = Form::new().part(ARTIFACTS_FIELD, part);

        let exchange = match self.artifacts_request(job, Method::POST).await {
            Ok(request) => match request.multipart(form).send().await {
                Ok(response) => Exchange::from_status(response.status()),
                Err(err) => {
                    warn!(job_id, error = %err, "Uploading artifacts to coordinator failed");
                    Exchange::Unreachable
                }
            },
            Err(err) => {
                warn!(job_id, error = %err, "Uploading artifacts to coordinator failed");
                Exchange::from(&err)
            }
        };

        let state = classify::upload_state(exchange);
        match state {
            UploadState::Succeeded => info!(job_id, "Uploading artifacts to coordinator... uploaded"),
            UploadState::TooLarge => warn!(job_id, "Uploading artifacts to coordinator... too large archive"),
            UploadState::Forbidden => warn!(job_id, "Uploading artifacts to coordinator... forbidden"),
            UploadState::Failed => warn!(job_id, ?exchange, "Uploading artifacts to coordinator... failed"),
        }
        state
    }

    pub(crate) async fn fetch_artifacts(&self, job: &JobCredentials, path: &Path) -> DownloadState {
        let job_id = job.id;

        let response = match self.artifacts_request(job, Method::GET).await {
            Ok(request) => request.send().await.map_err(Into::into),
            Err(err) => Err(err),
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(job_id, error = %err, "Downloading artifacts from coordinator failed");
                return classify::download_state(Exchange::from(&err));
            }
        };

        let exchange = Exchange::from_status(response.status());
        if exchange != Exchange::Answered(ResponseClass::Success) {
            let state = classify::download_state(exchange);
            warn!(job_id, ?exchange, ?state, "Downloading artifacts from coordinator... not downloaded");
            return state;
        }

        match write_body(response, path).await {
            Ok(bytes) => {
                info!(job_id, bytes, path = %path.display(), "Downloading artifacts from coordinator... ok");
                DownloadState::Succeeded
            }
            Err(err) => {
                error!(job_id, path = %path.display(), error = %err, "Saving artifacts archive failed");
                // Never leave a truncated archive behind
                let _ = tokio::fs::remove_file(path).await;
                DownloadState::Failed
            }
        }
    }
}

/// Stream the archive from disk with a known length
async fn archive_part(path: &Path) -> Result<Part> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifacts".to_string());

    Ok(Part::stream_with_length(Body::from(file), length).file_name(file_name))
}

async fn write_body(mut response: Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
