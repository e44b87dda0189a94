//! Tracing setup for the userdb CLI
//!
//! Usage:
//!   userdb --debug ...              # Debug logging to stderr
//!   RUST_LOG=userdb_core=debug ...  # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                        # Log filter (default: warn)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Log at debug level unless RUST_LOG says otherwise
    pub debug: bool,
}

/// Initialize console tracing.
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
pub fn init(config: &TracingConfig) -> Result<()> {
    let fallback = if config.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
