use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LIVENESS_POLL_SECS: u64 = 5;
const DEFAULT_HEARTBEAT_SECS: u64 = 60;
const DEFAULT_LOGOUT_GRACE_SECS: u64 = 4;

/// Application configuration with validation.
///
/// Values layer from `config/default.toml`, then `config/<environment>.toml`,
/// then `STOCKROOM_`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the backend REST API
    #[validate(url)]
    pub api_base_url: String,

    /// Timeout applied to every gateway request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How often the session-liveness poller checks the revocation set
    #[serde(default = "default_liveness_poll")]
    pub liveness_poll_secs: u64,

    /// Interval of the activity heartbeat while authenticated
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    /// Delay between the revocation warning and the forced logout
    #[serde(default = "default_logout_grace")]
    pub logout_grace_secs: u64,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_liveness_poll() -> u64 {
    DEFAULT_LIVENESS_POLL_SECS
}
fn default_heartbeat() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}
fn default_logout_grace() -> u64 {
    DEFAULT_LOGOUT_GRACE_SECS
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    /// Minimal constructor used by tests and embedders that configure
    /// programmatically.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            liveness_poll_secs: DEFAULT_LIVENESS_POLL_SECS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
            logout_grace_secs: DEFAULT_LOGOUT_GRACE_SECS,
            environment: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }

    /// Loads configuration from files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            env::var("STOCKROOM_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config: AppConfig = Config::builder()
            .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
            .add_source(
                File::with_name(&format!("{CONFIG_DIR}/{environment}")).required(false),
            )
            .add_source(Environment::with_prefix("STOCKROOM"))
            .build()?
            .try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        info!(environment = %config.environment, "configuration loaded");
        Ok(config)
    }
}
