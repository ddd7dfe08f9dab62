//! Client configuration for Kuneo
//!
//! [`ClientConfig`] is fixed at construction: once handed to
//! [`KuneoClient`](crate::KuneoClient) it is only ever read. Values can come
//! from code (builder-style `with_*` setters), from serde (JSON/TOML in the
//! host's own config), or from the environment via [`ClientConfig::from_env`].

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{KuneoError, Result};

/// Production governance endpoint.
pub const DEFAULT_BASE_URL: &str = "https://kuneo.tech";
/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Time between automatic heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);
/// Grace period before the first heartbeat tick, so it does not race the host's
/// first explicit telemetry call.
pub const DEFAULT_HEARTBEAT_INITIAL_DELAY: Duration = Duration::from_secs(5);

const ENV_API_KEY: &str = "KUNEO_API_KEY";
const ENV_BASE_URL: &str = "KUNEO_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "KUNEO_TIMEOUT_SECS";
const ENV_AUTO_HEARTBEAT: &str = "KUNEO_AUTO_HEARTBEAT";
const ENV_HEARTBEAT_INTERVAL_SECS: &str = "KUNEO_HEARTBEAT_INTERVAL_SECS";
const ENV_HEARTBEAT_INITIAL_DELAY_SECS: &str = "KUNEO_HEARTBEAT_INITIAL_DELAY_SECS";

/// Configuration for a single governance session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent API key issued by the Kuneo dashboard.
    pub api_key: String,
    /// Base URL of the governance service, without trailing slash.
    pub base_url: String,
    /// Upper bound for every telemetry or validation request.
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
    /// Whether [`KuneoClient::start`](crate::KuneoClient::start) spawns the heartbeat task.
    pub auto_heartbeat: bool,
    /// Time between heartbeat ticks.
    #[serde(rename = "heartbeat_interval_secs", with = "duration_secs")]
    pub heartbeat_interval: Duration,
    /// Delay before the first heartbeat tick.
    #[serde(rename = "heartbeat_initial_delay_secs", with = "duration_secs")]
    pub heartbeat_initial_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            auto_heartbeat: true,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_initial_delay: DEFAULT_HEARTBEAT_INITIAL_DELAY,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("auto_heartbeat", &self.auto_heartbeat)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("heartbeat_initial_delay", &self.heartbeat_initial_delay)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the API key.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Self::default()
        }
    }

    /// Override the governance base URL. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the automatic heartbeat.
    pub fn with_auto_heartbeat(mut self, enabled: bool) -> Self {
        self.auto_heartbeat = enabled;
        self
    }

    /// Override the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Override the delay before the first heartbeat tick.
    pub fn with_heartbeat_initial_delay(mut self, delay: Duration) -> Self {
        self.heartbeat_initial_delay = delay;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// `KUNEO_API_KEY` is required; `KUNEO_BASE_URL`, `KUNEO_TIMEOUT_SECS`,
    /// `KUNEO_AUTO_HEARTBEAT`, `KUNEO_HEARTBEAT_INTERVAL_SECS` and
    /// `KUNEO_HEARTBEAT_INITIAL_DELAY_SECS` override the defaults when set.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| KuneoError::Config(format!("{} is not set", ENV_API_KEY)))?;

        let mut config = Self::new(api_key.trim());

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(base_url.trim());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout = parse_secs(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_AUTO_HEARTBEAT) {
            config.auto_heartbeat = parse_bool(ENV_AUTO_HEARTBEAT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HEARTBEAT_INTERVAL_SECS) {
            config.heartbeat_interval = parse_secs(ENV_HEARTBEAT_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HEARTBEAT_INITIAL_DELAY_SECS) {
            config.heartbeat_initial_delay = parse_secs(ENV_HEARTBEAT_INITIAL_DELAY_SECS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(KuneoError::Config("API key is empty".to_string()));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            KuneoError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(KuneoError::Config(format!(
                "Base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(KuneoError::Config("Timeout must be positive".to_string()));
        }
        if self.auto_heartbeat && self.heartbeat_interval.is_zero() {
            return Err(KuneoError::Config(
                "Heartbeat interval must be positive when auto heartbeat is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Telemetry endpoint for this agent: `{base_url}/api/telemetry/{api_key}`.
    pub fn telemetry_url(&self) -> String {
        format!(
            "{}/api/telemetry/{}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        )
    }

    /// Pre-trade validation endpoint: `{base_url}/api/validate-trade`.
    pub fn validate_url(&self) -> String {
        format!("{}/api/validate-trade", self.base_url.trim_end_matches('/'))
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| KuneoError::Config(format!("{} must be a number, got '{}'", key, raw)))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| KuneoError::Config(format!("{} is out of range: {}", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(KuneoError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

/// Serialize `Duration` as fractional seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}
