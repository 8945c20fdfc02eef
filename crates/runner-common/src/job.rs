//! Jobs as handed out by the coordination server

use serde::{Deserialize, Serialize};

/// Job lifecycle state reported back to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl JobState {
    /// Is this a terminal state?
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failed | JobState::Canceled)
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Success => "success",
            JobState::Failed => "failed",
            JobState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable exported into the job environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobVariable {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub public: bool,
}

/// A job returned by a successful poll
///
/// Only `id` is required on the wire. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Server-assigned job identifier
    pub id: u64,

    /// Job-scoped token used for trace and artifact operations
    #[serde(default)]
    pub token: String,

    /// Job name
    #[serde(default)]
    pub name: String,

    /// Pipeline stage the job belongs to
    #[serde(default)]
    pub stage: String,

    #[serde(default)]
    pub project_id: u64,

    /// Git ref being built
    #[serde(default, rename = "ref")]
    pub ref_name: String,

    #[serde(default)]
    pub sha: String,

    #[serde(default)]
    pub before_sha: String,

    #[serde(default)]
    pub repo_url: String,

    /// Script to execute
    #[serde(default)]
    pub commands: String,

    /// Execution timeout in seconds (0 = runner default)
    #[serde(default)]
    pub timeout: u64,

    #[serde(default)]
    pub allow_git_fetch: bool,

    #[serde(default)]
    pub variables: Vec<JobVariable>,

    /// Free-form execution options
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl JobDescriptor {
    /// Credentials for job-scoped calls against the given server
    pub fn credentials(&self, url: impl Into<String>) -> crate::JobCredentials {
        crate::JobCredentials::new(self.id, url, self.token.clone())
    }
}

/// Runner token issued by a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredRunner {
    pub token: String,
}

/// Outcome of polling for the next job
#[derive(Debug, Clone, PartialEq)]
pub enum JobPoll {
    /// A job was assigned to this runner
    Received(Box<JobDescriptor>),
    /// No job is available right now; the runner is healthy
    Empty,
    /// Token rejected, server unreachable, or response unusable
    Unhealthy,
}

impl JobPoll {
    /// Should the caller keep polling with this identity?
    pub fn is_healthy(&self) -> bool {
        !matches!(self, JobPoll::Unhealthy)
    }

    /// Take the assigned job, if any
    pub fn into_job(self) -> Option<JobDescriptor> {
        match self {
            JobPoll::Received(job) => Some(*job),
            JobPoll::Empty | JobPoll::Unhealthy => None,
        }
    }
}
