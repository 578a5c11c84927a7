//! Runtime configuration from environment variables.
//!
//! # Responsibility
//! - Collect storage, logging and collaborator settings in one value.
//! - Reject malformed overrides instead of silently ignoring them.
//!
//! # Invariants
//! - Every field has a default; an empty environment is a valid config.
//! - A blank or missing API key disables analysis (fallback results only).

use crate::analysis::gemini::{DEFAULT_ANALYSIS_TIMEOUT, DEFAULT_GEMINI_MODEL};
use crate::analysis::{DisabledAnalyzer, GeminiAnalyzer, GeminiConfig, ImageAnalyzer};
use crate::logging::{default_log_level, normalize_level};
use crate::session::DEFAULT_LOGIN_DELAY;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "PICVOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PICVOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PICVOTE_LOG_DIR";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_ANALYSIS_MODEL: &str = "PICVOTE_ANALYSIS_MODEL";
pub const ENV_ANALYSIS_TIMEOUT_MS: &str = "PICVOTE_ANALYSIS_TIMEOUT_MS";
pub const ENV_LOGIN_DELAY_MS: &str = "PICVOTE_LOGIN_DELAY_MS";

const DEFAULT_DB_FILE_NAME: &str = "picvote.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a positive integer, got `{value}`")
            }
            Self::InvalidLogLevel(value) => write!(
                f,
                "`{ENV_LOG_LEVEL}` must be one of trace|debug|info|warn|error, got `{value}`"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "`{ENV_LOG_DIR}` must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub analysis_model: String,
    pub analysis_timeout: Duration,
    pub login_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            api_key: None,
            analysis_model: DEFAULT_GEMINI_MODEL.to_string(),
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            login_delay: DEFAULT_LOGIN_DELAY,
        }
    }
}

impl AppConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            let normalized =
                normalize_level(&level).map_err(|_| ConfigError::InvalidLogLevel(level.clone()))?;
            config.log_level = normalized.to_string();
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            if !Path::new(&dir).is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(PathBuf::from(dir));
        }
        config.api_key = get(ENV_API_KEY).or_else(|| get(ENV_GEMINI_API_KEY));
        if let Some(model) = get(ENV_ANALYSIS_MODEL) {
            config.analysis_model = model;
        }
        if let Some(value) = get(ENV_ANALYSIS_TIMEOUT_MS) {
            config.analysis_timeout = parse_millis(ENV_ANALYSIS_TIMEOUT_MS, &value)?;
            if config.analysis_timeout.is_zero() {
                return Err(ConfigError::InvalidNumber {
                    key: ENV_ANALYSIS_TIMEOUT_MS,
                    value,
                });
            }
        }
        if let Some(value) = get(ENV_LOGIN_DELAY_MS) {
            config.login_delay = parse_millis(ENV_LOGIN_DELAY_MS, &value)?;
        }

        Ok(config)
    }

    /// Builds the analyzer these settings describe.
    ///
    /// Without an API key, or when the HTTP client cannot be built, every
    /// analysis resolves to the fallback result.
    pub fn build_analyzer(&self) -> Arc<dyn ImageAnalyzer> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Arc::new(DisabledAnalyzer);
        };
        let gemini = GeminiConfig {
            model: self.analysis_model.clone(),
            timeout: self.analysis_timeout,
            ..GeminiConfig::new(api_key)
        };
        match GeminiAnalyzer::new(gemini) {
            Ok(analyzer) => Arc::new(analyzer),
            Err(err) => {
                warn!(
                    "event=analyzer_init module=config status=fallback error_code={} error={}",
                    err.code(),
                    err
                );
                Arc::new(DisabledAnalyzer)
            }
        }
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}
