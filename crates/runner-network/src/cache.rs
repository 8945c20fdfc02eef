//! Transport handle cache keyed by destination identity
//!
//! Building a `reqwest::Client` sets up a connection pool and, with a custom
//! trust root, reads and parses a PEM file. Job loops call into the client
//! many times per second, so handles are built once per (URL, trust root)
//! and shared.
//!
//! The map lock is held only to look up or insert a per-identity `OnceCell`.
//! Construction runs inside that cell: concurrent callers for one identity
//! wait for a single build, callers for other identities are not blocked.
//! Failed builds leave the cell empty so a later call tries again.

use crate::config::ClientConfig;
use crate::error::{NetworkError, Result};
use reqwest::Url;
use runner_common::{JobCredentials, RunnerCredentials};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

/// Destination identity: normalised server URL plus optional trust root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    url: String,
    tls_ca_file: Option<PathBuf>,
}

impl ClientKey {
    /// Validate `url` and build a key
    ///
    /// Only absolute `http`/`https` URLs with a host are accepted.
    pub fn new(url: &str, tls_ca_file: Option<&Path>) -> Result<Self> {
        let invalid = |reason: &str| NetworkError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }

        Ok(ClientKey {
            url: parsed.as_str().trim_end_matches('/').to_string(),
            tls_ca_file: tls_ca_file.map(Path::to_path_buf),
        })
    }

    /// Normalised server URL, without trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn tls_ca_file(&self) -> Option<&Path> {
        self.tls_ca_file.as_deref()
    }

    /// Full URL of a protocol endpoint
    pub fn endpoint(&self, api_prefix: &str, path: &str) -> String {
        let prefix = api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        if prefix.is_empty() {
            format!("{}/{}", self.url, path)
        } else {
            format!("{}/{}/{}", self.url, prefix, path)
        }
    }
}

impl TryFrom<&RunnerCredentials> for ClientKey {
    type Error = NetworkError;

    fn try_from(credentials: &RunnerCredentials) -> Result<Self> {
        ClientKey::new(&credentials.url, credentials.tls_ca_file.as_deref())
    }
}

impl TryFrom<&JobCredentials> for ClientKey {
    type Error = NetworkError;

    fn try_from(credentials: &JobCredentials) -> Result<Self> {
        ClientKey::new(&credentials.url, credentials.tls_ca_file.as_deref())
    }
}

type HandleCell = Arc<OnceCell<Arc<reqwest::Client>>>;

/// Shared store of transport handles
pub struct ConnectionCache {
    config: ClientConfig,
    clients: RwLock<HashMap<ClientKey, HandleCell>>,
}

impl ConnectionCache {
    /// Create an empty cache; handles are built with `config`
    pub fn new(config: ClientConfig) -> Self {
        ConnectionCache {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Return the handle for `key`, building it on first use
    ///
    /// Value-equal keys always yield the same `Arc`.
    pub async fn acquire(&self, key: &ClientKey) -> Result<Arc<reqwest::Client>> {
        let cell = self.cell(key).await;
        let client = cell.get_or_try_init(|| self.build(key)).await?;
        Ok(Arc::clone(client))
    }

    /// Number of identities with a built handle
    pub async fn len(&self) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn cell(&self, key: &ClientKey) -> HandleCell {
        if let Some(cell) = self.clients.read().await.get(key) {
            return Arc::clone(cell);
        }

        let mut clients = self.clients.write().await;
        Arc::clone(clients.entry(key.clone()).or_default())
    }

    async fn build(&self, key: &ClientKey) -> Result<Arc<reqwest::Client>> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connect_timeout);

        if let Some(path) = key.tls_ca_file() {
            let certificate = load_trust_root(path).await?;
            builder = builder
                .tls_built_in_root_certs(false)
                .add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::Build(e.to_string()))?;

        debug!(
            url = %key.url(),
            tls_ca_file = ?key.tls_ca_file(),
            "Built transport handle"
        );
        Ok(Arc::new(client))
    }
}

impl Default for ConnectionCache {
    fn default() -> Self {
        ConnectionCache::new(ClientConfig::default())
    }
}

async fn load_trust_root(path: &Path) -> Result<reqwest::Certificate> {
    let trust_root_error = |reason: String| NetworkError::TrustRoot {
        path: path.to_path_buf(),
        reason,
    };

    let pem = tokio::fs::read(path)
        .await
        .map_err(|e| trust_root_error(e.to_string()))?;

    // reqwest defers PEM parsing to client construction and skips non-certificate input
    if !String::from_utf8_lossy(&pem).contains("-----BEGIN CERTIFICATE-----") {
        return Err(trust_root_error("no PEM certificate found".to_string()));
    }

    reqwest::Certificate::from_pem(&pem).map_err(|e| trust_root_error(e.to_string()))
}
