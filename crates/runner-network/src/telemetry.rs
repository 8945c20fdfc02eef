//! Tracing setup for runner processes.
//!
//! Protocol operations log through `tracing` with `job_id`, `runner`, `offset`
//! and `limit` fields; this module installs the subscriber that renders them.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP stack crates that are chatty below `warn`
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

/// Install the global subscriber
///
/// `RUST_LOG` wins when set. Otherwise `level` applies to runner code and the
/// HTTP stack is held at `warn`. With `json` every event is one JSON line.
///
/// Returns false when a global subscriber was already installed.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    installed.is_ok()
}

fn default_filter(level: Level) -> EnvFilter {
    let directives = QUIET_TARGETS
        .iter()
        .fold(level.as_str().to_lowercase(), |acc, target| {
            format!("{acc},{target}=warn")
        });
    EnvFilter::new(directives)
}
