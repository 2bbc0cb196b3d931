//! Configuration management.
//!
//! Settings come from an optional TOML file layered under `RNC_SEARCH__*`
//! environment variables (`RNC_SEARCH__FETCH__DELAY_SECS=2`).
//!
//! ```toml
//! [fetch]
//! delay_secs = 1.0
//! encoding = "windows-1251"
//! timeout_secs = 30
//!
//! [retry]
//! max_attempts = 8
//! max_elapsed_secs = 600
//! backoff_unit_ms = 1000
//! unbounded = false
//!
//! [selectors]
//! documents = "body > div.content > p.found > span:nth-of-type(1)"
//! contexts = "body > div.content > p.found > span:nth-of-type(3)"
//! pager = "p.pager"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{Backoff, RetryPolicy, DEFAULT_ENCODING_LABEL, DEFAULT_USER_AGENT};

pub use ::config::ConfigError;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "rnc-search.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Retry settings for throttled fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Where counts and results live in the result pages
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Politeness delay before every request, in seconds
    #[serde(default = "default_delay")]
    pub delay_secs: f64,

    /// Encoding label of the pages
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay(),
            encoding: default_encoding(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Politeness delay; negative or invalid values mean no delay
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_delay() -> f64 {
    1.0
}

fn default_encoding() -> String {
    DEFAULT_ENCODING_LABEL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per page (ignored when `unbounded`)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    /// Maximum seconds spent on one page (ignored when `unbounded`)
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_secs: Option<u64>,

    /// Fibonacci backoff unit in milliseconds
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,

    /// Retry until the page loads, however long it takes
    #[serde(default)]
    pub unbounded: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_elapsed_secs: default_max_elapsed(),
            backoff_unit_ms: default_backoff_unit(),
            unbounded: false,
        }
    }
}

impl RetryConfig {
    /// Retry policy described by this configuration
    pub fn policy(&self) -> RetryPolicy {
        let backoff = Backoff::Fibonacci {
            unit: Duration::from_millis(self.backoff_unit_ms),
        };

        if self.unbounded {
            return RetryPolicy::unbounded().backoff(backoff);
        }

        RetryPolicy {
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
            backoff,
        }
    }
}

fn default_max_attempts() -> Option<u32> {
    Some(8)
}

fn default_max_elapsed() -> Option<u64> {
    Some(600)
}

fn default_backoff_unit() -> u64 {
    1000
}

/// CSS selectors for the parts of a result page we read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Element holding the number of matching documents
    #[serde(default = "default_documents_selector")]
    pub documents: String,

    /// Element holding the number of matching contexts
    #[serde(default = "default_contexts_selector")]
    pub contexts: String,

    /// Pager paragraph preceding the result list
    #[serde(default = "default_pager_selector")]
    pub pager: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            documents: default_documents_selector(),
            contexts: default_contexts_selector(),
            pager: default_pager_selector(),
        }
    }
}

fn default_documents_selector() -> String {
    "body > div.content > p.found > span:nth-of-type(1)".to_string()
}

fn default_contexts_selector() -> String {
    "body > div.content > p.found > span:nth-of-type(3)".to_string()
}

fn default_pager_selector() -> String {
    "p.pager".to_string()
}

impl Config {
    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Errors writing a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(
            ::config::Environment::with_prefix("RNC_SEARCH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Look for a configuration file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("rnc-search").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
