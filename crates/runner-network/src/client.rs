//! Coordination server client
//!
//! `CoordinatorClient` implements [`Network`] over HTTP. It owns the
//! connection cache and nothing else, so one instance is shared by every job
//! loop and lifecycle task of a runner process.

use crate::cache::{ClientKey, ConnectionCache};
use crate::classify::{self, Exchange, ResponseClass};
use crate::config::ClientConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response};
use runner_common::{
    DownloadState, JobCredentials, JobDescriptor, JobPoll, JobState, Network, PatchState,
    RegisteredRunner, RunnerConfig, RunnerCredentials, TracePatch, UpdateState, UploadState,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Header carrying the job-scoped token
pub const JOB_TOKEN_HEADER: &str = "job-token";

/// Job id that never exists, used to probe token validity
pub const VERIFY_SENTINEL_JOB_ID: i64 = -1;

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct RegisterRunnerRequest<'a> {
    token: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
}

#[derive(Serialize)]
struct UpdateJobRequest<'a> {
    token: &'a str,
    state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a str>,
}

/// HTTP implementation of the coordination protocol
pub struct CoordinatorClient {
    config: ClientConfig,
    cache: ConnectionCache,
}

impl CoordinatorClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Self {
        CoordinatorClient {
            cache: ConnectionCache::new(config.clone()),
            config,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport handles shared by this client
    pub fn cache(&self) -> &ConnectionCache {
        &self.cache
    }

    /// Resolve the handle for `key` and start a request to `path`
    pub(crate) async fn request(
        &self,
        key: &ClientKey,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder> {
        let client = self.cache.acquire(key).await?;
        let url = key.endpoint(&self.config.api_prefix, path);
        debug!(%method, %url, "Sending request");
        Ok(client.request(method, url))
    }

    /// Send a JSON body authenticated by runner credentials
    async fn send_json<B: Serialize>(
        &self,
        credentials: &RunnerCredentials,
        method: Method,
        path: &str,
        body: &B,
        expect_body: bool,
    ) -> Result<Response> {
        let key = ClientKey::try_from(credentials)?;
        let mut request = self.request(&key, method, path).await?.json(body);
        if expect_body {
            request = request.header(ACCEPT, "application/json");
        }
        Ok(request.send().await?)
    }
}

impl Default for CoordinatorClient {
    fn default() -> Self {
        Self::from_env()
    }
}

#[async_trait]
impl Network for CoordinatorClient {
    async fn poll_job(&self, config: &RunnerConfig) -> JobPoll {
        let credentials = &config.credentials;
        let runner = credentials.short_description();
        let request = TokenRequest {
            token: &credentials.token,
        };

        let response = match self
            .send_json(credentials, Method::POST, "jobs/register", &request, true)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%runner, error = %err, "Checking for jobs failed");
                return JobPoll::Unhealthy;
            }
        };

        let status = response.status();
        match ResponseClass::from_status(status) {
            ResponseClass::Success => match response.json::<JobDescriptor>().await {
                Ok(job) => {
                    info!(%runner, job_id = job.id, "Checking for jobs... received");
                    JobPoll::Received(Box::new(job))
                }
                Err(err) => {
                    warn!(%runner, error = %err, "Checking for jobs... malformed job payload");
                    JobPoll::Unhealthy
                }
            },
            ResponseClass::NotFound => {
                debug!(%runner, "Checking for jobs... nothing");
                JobPoll::Empty
            }
            ResponseClass::Forbidden => {
                warn!(%runner, "Checking for jobs... forbidden");
                JobPoll::Unhealthy
            }
            _ => {
                warn!(%runner, %status, "Checking for jobs... unexpected status");
                JobPoll::Unhealthy
            }
        }
    }

    async fn register_runner(
        &self,
        credentials: &RunnerCredentials,
        description: &str,
        tags: &[String],
    ) -> Option<RegisteredRunner> {
        let request = RegisterRunnerRequest {
            token: &credentials.token,
            description,
            tags: (!tags.is_empty()).then(|| tags.join(",")),
        };

        let response = match self
            .send_json(credentials, Method::POST, "runners/register", &request, true)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Registering runner failed");
                return None;
            }
        };

        let status = response.status();
        match ResponseClass::from_status(status) {
            ResponseClass::Success => match response.json::<RegisteredRunner>().await {
                Ok(runner) => {
                    let token: String = runner.token.chars().take(8).collect();
                    info!(runner = %token, "Registering runner... succeeded");
                    Some(runner)
                }
                Err(err) => {
                    warn!(error = %err, "Registering runner... malformed response");
                    None
                }
            },
            ResponseClass::Forbidden => {
                warn!("Registering runner... forbidden (check registration token)");
                None
            }
            _ => {
                warn!(%status, "Registering runner... failed");
                None
            }
        }
    }

    async fn delete_runner(&self, credentials: &RunnerCredentials) -> bool {
        let runner = credentials.short_description();
        let request = TokenRequest {
            token: &credentials.token,
        };

        let exchange = match self
            .send_json(credentials, Method::DELETE, "runners/delete", &request, false)
            .await
        {
            Ok(response) => Exchange::from_status(response.status()),
            Err(err) => {
                warn!(%runner, error = %err, "Deleting runner failed");
                Exchange::from(&err)
            }
        };

        let deleted = classify::delete_succeeded(exchange);
        if deleted {
            info!(%runner, "Deleting runner... succeeded");
        } else {
            warn!(%runner, ?exchange, "Deleting runner... failed");
        }
        deleted
    }

    async fn verify_runner(&self, credentials: &RunnerCredentials) -> bool {
        let runner = credentials.short_description();
        let request = TokenRequest {
            token: &credentials.token,
        };
        let path = format!("jobs/{VERIFY_SENTINEL_JOB_ID}");

        let exchange = match self
            .send_json(credentials, Method::PUT, &path, &request, false)
            .await
        {
            Ok(response) => Exchange::from_status(response.status()),
            Err(err) => {
                warn!(%runner, error = %err, "Verifying runner failed");
                Exchange::from(&err)
            }
        };

        let valid = classify::runner_is_valid(exchange);
        if valid {
            debug!(%runner, ?exchange, "Verifying runner... is alive");
        } else {
            warn!(%runner, ?exchange, "Verifying runner... is removed");
        }
        valid
    }

    async fn update_job(
        &self,
        config: &RunnerConfig,
        job_id: u64,
        state: JobState,
        trace: Option<&str>,
    ) -> UpdateState {
        let credentials = &config.credentials;
        let request = UpdateJobRequest {
            token: &credentials.token,
            state,
            trace,
        };
        let path = format!("jobs/{job_id}");

        let exchange = match self
            .send_json(credentials, Method::PUT, &path, &request, false)
            .await
        {
            Ok(response) => Exchange::from_status(response.status()),
            Err(err) => {
                warn!(job_id, error = %err, "Submitting job state failed");
                Exchange::from(&err)
            }
        };

        let outcome = classify::update_state(exchange);
        match outcome {
            UpdateState::Succeeded => debug!(job_id, %state, "Submitting job state... ok"),
            UpdateState::Abort => warn!(job_id, %state, ?exchange, "Submitting job state... aborted"),
            UpdateState::Failed => warn!(job_id, %state, ?exchange, "Submitting job state... failed"),
        }
        outcome
    }

    async fn patch_trace(
        &self,
        job: &JobCredentials,
        patch: &TracePatch,
    ) -> runner_common::Result<PatchState> {
        self.send_trace_patch(job, patch).await
    }

    async fn upload_artifacts(&self, job: &JobCredentials, path: &Path) -> UploadState {
        self.send_artifacts(job, path).await
    }

    async fn download_artifacts(&self, job: &JobCredentials, path: &Path) -> DownloadState {
        self.fetch_artifacts(job, path).await
    }
}
