use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use jaib_core::FetchConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 20_000;

/// Extra time the whole request may take beyond the fetch budget, for parsing
/// and extraction.
const PROCESSING_GRACE: Duration = Duration::from_secs(10);

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub fetch_timeout: Duration,
    pub user_agent: Option<String>,
}

impl ServerConfig {
    /// Load configuration from `JAIB_BIND_ADDR`, `JAIB_FETCH_TIMEOUT_MS` and
    /// `JAIB_USER_AGENT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("JAIB_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("JAIB_BIND_ADDR must be a socket address such as 0.0.0.0:8000")?;

        let timeout_ms = match lookup("JAIB_FETCH_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("JAIB_FETCH_TIMEOUT_MS must be a number of milliseconds")?,
            None => DEFAULT_FETCH_TIMEOUT_MS,
        };

        let user_agent = lookup("JAIB_USER_AGENT").filter(|ua| !ua.trim().is_empty());

        Ok(Self { bind_addr, fetch_timeout: Duration::from_millis(timeout_ms), user_agent })
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: self.fetch_timeout, ..FetchConfig::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    /// Upper bound on a whole request, fetch included.
    pub fn request_timeout(&self) -> Duration {
        self.fetch_timeout + PROCESSING_GRACE
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            user_agent: None,
        }
    }
}
