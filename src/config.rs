use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ads: AdsSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub progress: ProgressSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct AdsSettings {
    #[serde(default = "default_ads_base_url")]
    pub base_url: String,
    #[serde(default = "default_ads_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_ads_locale")]
    pub locale: String,
    #[serde(default = "default_ads_result_limit")]
    pub result_limit: u32,
    #[serde(default = "default_ads_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            base_url: default_ads_base_url(),
            api_version: default_ads_api_version(),
            access_token: String::new(),
            locale: default_ads_locale(),
            result_limit: default_ads_result_limit(),
            timeout_secs: default_ads_timeout_secs(),
        }
    }
}

fn default_ads_base_url() -> String { "https://graph.facebook.com".to_string() }
fn default_ads_api_version() -> String { "v19.0".to_string() }
fn default_ads_locale() -> String { "en_US".to_string() }
fn default_ads_result_limit() -> u32 { 50 }
fn default_ads_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_threshold() -> f64 { crate::core::DEFAULT_THRESHOLD }
fn default_max_batch_size() -> usize { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressSettings {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

fn default_channel_capacity() -> usize { 1024 }
fn default_keep_alive_secs() -> u64 { 15 }

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_retry_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_capacity")]
    pub capacity: usize,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_retry_interval_secs(),
            max_attempts: default_retry_max_attempts(),
            capacity: default_retry_capacity(),
        }
    }
}

fn default_true() -> bool { true }
fn default_retry_interval_secs() -> u64 { 3600 }
fn default_retry_max_attempts() -> u32 { 3 }
fn default_retry_capacity() -> usize { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CRITERIA__)
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CRITERIA__SERVER__PORT -> server.port
            .add_source(env_source());

        with_secret_overrides(builder)?.build()?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source());

        with_secret_overrides(builder)?.build()?.try_deserialize()
    }

    /// Parse settings from an inline TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("CRITERIA")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// The ads token is usually provided as a bare ADS_ACCESS_TOKEN secret
fn with_secret_overrides(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    match std::env::var("ADS_ACCESS_TOKEN") {
        Ok(token) if !token.is_empty() => builder.set_override("ads.access_token", token),
        _ => Ok(builder),
    }
}
