//! Runner and job credentials
//!
//! Runner credentials authenticate the runner identity (polling, registration,
//! verification). Job credentials carry a job-scoped token that authorises
//! operations on exactly one job.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of a runner against one coordination server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerCredentials {
    /// Coordination server URL
    pub url: String,
    /// Runner registration token
    pub token: String,
    /// PEM file with a custom trust root for the server certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_file: Option<PathBuf>,
}

impl RunnerCredentials {
    /// Create credentials for a server and token
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        RunnerCredentials {
            url: url.into(),
            token: token.into(),
            tls_ca_file: None,
        }
    }

    /// Pin a custom trust root
    pub fn with_tls_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_ca_file = Some(path.into());
        self
    }

    /// Token prefix safe to show in logs
    pub fn short_description(&self) -> String {
        self.token.chars().take(8).collect()
    }
}

/// Runner credentials plus runner-local tuning
///
/// The client only reads the credentials; the remaining fields are passed
/// through for the job-execution loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Human readable runner name
    #[serde(default)]
    pub name: String,
    /// Executor the runner hands jobs to (e.g. "shell", "docker")
    #[serde(default)]
    pub executor: String,
    /// Maximum number of jobs this runner handles at once (0 = unlimited)
    #[serde(default)]
    pub limit: usize,
    /// Identity used against the coordination server
    #[serde(flatten)]
    pub credentials: RunnerCredentials,
}

impl RunnerConfig {
    /// Create a config with default tuning
    pub fn new(credentials: RunnerCredentials) -> Self {
        RunnerConfig {
            name: String::new(),
            executor: String::new(),
            limit: 0,
            credentials,
        }
    }

    /// Set the runner name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the executor
    pub fn with_executor(mut self, executor: impl Into<String>) -> Self {
        self.executor = executor.into();
        self
    }
}

impl From<RunnerCredentials> for RunnerConfig {
    fn from(credentials: RunnerCredentials) -> Self {
        RunnerConfig::new(credentials)
    }
}

/// Credentials scoped to a single job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCredentials {
    /// Server-assigned job identifier
    pub id: u64,
    /// Coordination server URL
    pub url: String,
    /// Job-scoped token
    pub token: String,
    /// PEM file with a custom trust root for the server certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_file: Option<PathBuf>,
}

impl JobCredentials {
    /// Create credentials for one job
    pub fn new(id: u64, url: impl Into<String>, token: impl Into<String>) -> Self {
        JobCredentials {
            id,
            url: url.into(),
            token: token.into(),
            tls_ca_file: None,
        }
    }

    /// Pin a custom trust root
    pub fn with_tls_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_ca_file = Some(path.into());
        self
    }
}
