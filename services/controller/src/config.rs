use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use brood_reconcile::BackoffPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,

    /// Concurrent reconciliation workers.
    pub workers: usize,

    /// Upper bound on a single reconciliation run.
    pub reconcile_timeout: Duration,

    /// Interval at which every bird is re-queued.
    pub resync_interval: Duration,

    pub backoff: BackoffPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("BROOD_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("BROOD_LISTEN_ADDR must be a socket address")?;

        let log_level = std::env::var("BROOD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let workers = env_number("BROOD_WORKERS", 4)?;
        if workers == 0 {
            anyhow::bail!("BROOD_WORKERS must be at least 1");
        }

        let reconcile_timeout = Duration::from_secs(env_number("BROOD_RECONCILE_TIMEOUT_SECS", 30)?);
        let resync_interval = Duration::from_secs(env_number("BROOD_RESYNC_INTERVAL_SECS", 300)?);

        let backoff = BackoffPolicy {
            base: Duration::from_millis(env_number("BROOD_BACKOFF_BASE_MS", 100)?),
            max: Duration::from_secs(env_number("BROOD_BACKOFF_MAX_SECS", 30)?),
            ..BackoffPolicy::default()
        };

        Ok(Self {
            listen_addr,
            log_level,
            workers: workers as usize,
            reconcile_timeout,
            resync_interval,
            backoff,
        })
    }
}

fn env_number(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a non-negative integer, got '{value}'")),
        Err(_) => Ok(default),
    }
}
