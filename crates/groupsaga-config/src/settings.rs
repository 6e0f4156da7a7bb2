use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use groupsaga_core::NodeName;
use serde::Deserialize;
use tracing::debug;

use crate::Result;
use crate::error::ConfigError;

const ENV_HOSTS: &str = "HOSTS";
const ENV_RETRY_DELAY: &str = "CELERY_DEFAULT_RETRY_DELAY";
const ENV_MAX_RETRIES: &str = "CELERY_DEFAULT_MAX_RETRIES";
const ENV_REDIS_HOST: &str = "REDIS_HOST";
const ENV_REDIS_PORT: &str = "REDIS_PORT";
const ENV_REDIS_DB: &str = "REDIS_DB";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_secs: 10,
        }
    }
}

impl RetrySettings {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Redis,
    /// Process-local; only useful when every worker runs in this process.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    pub backend: LedgerBackend,
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            host: String::from("localhost"),
            port: 6379,
            db: 0,
        }
    }
}

impl LedgerSettings {
    #[must_use]
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSettings {
    pub workers: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeClientSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for NodeClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
        }
    }
}

impl NodeClientSettings {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Static configuration of the orchestrator.
///
/// Layered as defaults, then the optional TOML file, then environment
/// variables (`HOSTS`, `CELERY_DEFAULT_RETRY_DELAY`,
/// `CELERY_DEFAULT_MAX_RETRIES`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    nodes: Vec<NodeName>,
    retry: RetrySettings,
    ledger: LedgerSettings,
    queue: QueueSettings,
    node_client: NodeClientSettings,
}

impl Settings {
    /// Load from an optional file and the process environment, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable holds an invalid value, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values found through `lookup` onto the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for unparsable numbers. Blank
    /// entries in `HOSTS` are skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hosts) = lookup(ENV_HOSTS) {
            self.nodes = parse_hosts(&hosts)?;
            debug!(count = self.nodes.len(), "nodes taken from {ENV_HOSTS}");
        }
        if let Some(value) = lookup(ENV_RETRY_DELAY) {
            self.retry.delay_secs = parse_env(ENV_RETRY_DELAY, value)?;
        }
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = parse_env(ENV_MAX_RETRIES, value)?;
        }
        if let Some(value) = lookup(ENV_REDIS_HOST) {
            self.ledger.host = value;
        }
        if let Some(value) = lookup(ENV_REDIS_PORT) {
            self.ledger.port = parse_env(ENV_REDIS_PORT, value)?;
        }
        if let Some(value) = lookup(ENV_REDIS_DB) {
            self.ledger.db = parse_env(ENV_REDIS_DB, value)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::NoNodes`] for an empty fleet and
    /// [`ConfigError::NoWorkers`] for a queue without workers.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }
        if self.queue.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    /// Fleet members in attempt order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeName] {
        &self.nodes
    }

    #[must_use]
    pub fn retry(&self) -> &RetrySettings {
        &self.retry
    }

    #[must_use]
    pub fn ledger(&self) -> &LedgerSettings {
        &self.ledger
    }

    #[must_use]
    pub fn queue(&self) -> &QueueSettings {
        &self.queue
    }

    #[must_use]
    pub fn node_client(&self) -> &NodeClientSettings {
        &self.node_client
    }
}

fn parse_hosts(value: &str) -> Result<Vec<NodeName>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(|host| NodeName::new(host).map_err(ConfigError::from))
        .collect()
}

fn parse_env<T: FromStr>(name: &'static str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
