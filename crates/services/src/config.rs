use std::env;

use tutor_core::model::AttemptPolicy;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const BASE_URL_ENV: &str = "TUTOR_API_BASE_URL";
pub const MAX_ATTEMPTS_ENV: &str = "TUTOR_MAX_ATTEMPTS";

/// Settings shared by the HTTP client and the session loop.
#[derive(Clone, Debug)]
pub struct TutorConfig {
    pub base_url: Url,
    pub policy: AttemptPolicy,
}

impl TutorConfig {
    /// Read `TUTOR_API_BASE_URL` and `TUTOR_MAX_ATTEMPTS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TutorConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(&raw)?;
        }
        if let Some(raw) = lookup(MAX_ATTEMPTS_ENV).filter(|v| !v.trim().is_empty()) {
            config = config.with_max_attempts(&raw)?;
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` or `ConfigError::UnsupportedScheme`.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMaxAttempts` for non-numeric input and
    /// `ConfigError::Policy` for zero.
    pub fn with_max_attempts(mut self, raw: &str) -> Result<Self, ConfigError> {
        let parsed: u32 = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidMaxAttempts {
                raw: raw.to_string(),
            })?;
        self.policy = AttemptPolicy::new(parsed)?;
        Ok(self)
    }
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default tutor api url should be valid"),
            policy: AttemptPolicy::default(),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        raw: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            raw: raw.to_string(),
        });
    }
    Ok(url)
}
