use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wabot_api::{ApiResult, DashboardApi};
use wabot_connect::{ConnectTimings, RetryPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub connect: ConnectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub qr_refresh_secs: u64,
    pub qr_retry_delay_secs: u64,
    pub qr_max_failures: u32,
    pub code_retry_delay_secs: u64,
    pub code_max_retries: u32,
    pub pairing_status_interval_secs: u64,
    pub signup_status_interval_secs: u64,
    pub master_status_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 20,
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            qr_refresh_secs: 20,
            qr_retry_delay_secs: 5,
            qr_max_failures: 5,
            code_retry_delay_secs: 3,
            code_max_retries: 3,
            pairing_status_interval_secs: 3,
            signup_status_interval_secs: 5,
            master_status_interval_secs: 10,
        }
    }
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &PathBuf) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// `WABOT_BASE_URL` overrides the configured server.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("WABOT_BASE_URL") {
            if !url.trim().is_empty() {
                self.server.base_url = url.trim().to_string();
            }
        }
    }

    pub fn build_api(&self) -> ApiResult<DashboardApi> {
        DashboardApi::with_timeouts(
            &self.server.base_url,
            Duration::from_secs(self.server.connect_timeout_secs),
            Duration::from_secs(self.server.request_timeout_secs),
        )
    }

    pub fn timings(&self) -> ConnectTimings {
        let c = &self.connect;
        ConnectTimings {
            qr_policy: RetryPolicy::new(
                c.qr_max_failures.max(1),
                Duration::from_secs(c.qr_retry_delay_secs),
            ),
            qr_refresh: Duration::from_secs(c.qr_refresh_secs.max(1)),
            code_policy: RetryPolicy::with_retries(
                c.code_max_retries,
                Duration::from_secs(c.code_retry_delay_secs),
            ),
            master_status_every: Duration::from_secs(c.master_status_interval_secs.max(1)),
            signup_status_every: Duration::from_secs(c.signup_status_interval_secs.max(1)),
            pairing_status_every: Duration::from_secs(c.pairing_status_interval_secs.max(1)),
        }
    }
}
