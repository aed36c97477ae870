//! Configuration for the translation engine and the Gemini backend
use crate::ai::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const MAX_TOKENS_PER_REQUEST: usize = 400;
pub const MAX_RETRIES: u32 = 10;
pub const RETRY_DELAY_SECS: f64 = 1.0;
pub const QUOTA_EXHAUST_ERROR_DELAY_SECS: f64 = 10.0;
pub const REQUEST_DELAY_SECS: f64 = 0.5;
pub const CHARS_PER_TOKEN: usize = 4;

pub const ENV_PREFIX: &str = "DOC_TRANSLATOR_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Batching, retry and pacing knobs of the batch translation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Ceiling for the summed token estimate of one remote request.
    pub max_tokens_per_request: usize,
    /// Attempts per remote request before the batch falls back to source text.
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    /// Extra wait layered on top of the retry delay after a quota error.
    pub quota_exhaust_error_delay_secs: f64,
    /// Pause after every reply from the service.
    pub request_delay_secs: f64,
    pub chars_per_token: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_request: MAX_TOKENS_PER_REQUEST,
            max_retries: MAX_RETRIES,
            retry_delay_secs: RETRY_DELAY_SECS,
            quota_exhaust_error_delay_secs: QUOTA_EXHAUST_ERROR_DELAY_SECS,
            request_delay_secs: REQUEST_DELAY_SECS,
            chars_per_token: CHARS_PER_TOKEN,
        }
    }
}

impl EngineConfig {
    pub fn retry_delay(&self) -> Duration {
        secs_to_duration(self.retry_delay_secs)
    }

    pub fn quota_exhaust_error_delay(&self) -> Duration {
        secs_to_duration(self.quota_exhaust_error_delay_secs)
    }

    pub fn request_delay(&self) -> Duration {
        secs_to_duration(self.request_delay_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.retry_delay(),
            self.quota_exhaust_error_delay(),
        )
    }

    /// Zero-delay variant for tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.retry_delay_secs = 0.0;
        self.quota_exhaust_error_delay_secs = 0.0;
        self.request_delay_secs = 0.0;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens_per_request == 0 {
            return Err(ConfigError::invalid(
                "maxTokensPerRequest",
                "must be greater than zero",
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::invalid("maxRetries", "must be at least 1"));
        }
        for (key, value) in [
            ("retryDelaySecs", self.retry_delay_secs),
            ("quotaExhaustErrorDelaySecs", self.quota_exhaust_error_delay_secs),
            ("requestDelaySecs", self.request_delay_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(key, "must be a non-negative number"));
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::invalid(key, "is too large"));
            }
        }
        Ok(())
    }

    /// Applies `DOC_TRANSLATOR_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by full variable name, e.g.
    /// `DOC_TRANSLATOR_MAX_RETRIES`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        };

        if let Some((key, value)) = read("MAX_TOKENS_PER_REQUEST") {
            self.max_tokens_per_request = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = read("MAX_RETRIES") {
            self.max_retries = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = read("RETRY_DELAY_SECS") {
            self.retry_delay_secs = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = read("QUOTA_EXHAUST_ERROR_DELAY_SECS") {
            self.quota_exhaust_error_delay_secs = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = read("REQUEST_DELAY_SECS") {
            self.request_delay_secs = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = read("CHARS_PER_TOKEN") {
            self.chars_per_token = parse_value(&key, &value)?;
        }

        self.validate()
    }
}

/// Connection settings of the Gemini `generateContent` backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: crate::ai::gemini::DEFAULT_MODEL.to_string(),
            base_url: crate::ai::gemini::DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            timeout_secs: 120,
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl TranslatorConfig {
    /// Loads a config file; `.yaml`/`.yml` are read as YAML, anything else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let config: Self = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.engine.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse {value:?}")))
}

/// Negative and NaN become zero; values past `Duration::MAX` saturate.
fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::default();
        assert_eq!(config.engine.max_tokens_per_request, 400);
        assert_eq!(config.engine.max_retries, 10);
        assert_eq!(config.engine.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.engine.quota_exhaust_error_delay(), Duration::from_secs(10));
        assert_eq!(config.engine.request_delay(), Duration::from_millis(500));
        assert_eq!(config.engine.chars_per_token, 4);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_json_serialization() {
        let config = TranslatorConfig::default();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"maxTokensPerRequest\": 400"));

        let deserialized = TranslatorConfig::from_json(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TranslatorConfig::from_json(r#"{"engine": {"maxRetries": 3}}"#).unwrap();
        assert_eq!(config.engine.max_retries, 3);
        assert_eq!(config.engine.max_tokens_per_request, 400);
        assert_eq!(config.gemini, GeminiConfig::default());
    }

    #[test]
    fn test_rejects_zero_token_limit() {
        let err = TranslatorConfig::from_json(r#"{"engine": {"maxTokensPerRequest": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "maxTokensPerRequest"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DOC_TRANSLATOR_MAX_RETRIES", "4"),
            ("DOC_TRANSLATOR_REQUEST_DELAY_SECS", "0.25"),
            ("DOC_TRANSLATOR_CHARS_PER_TOKEN", " "),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.max_retries, 4);
        assert_eq!(config.request_delay(), Duration::from_millis(250));
        assert_eq!(config.chars_per_token, 4);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(|key| {
                (key == "DOC_TRANSLATOR_RETRY_DELAY_SECS").then(|| "soon".to_string())
            })
            .unwrap_err();
        assert!(err.to_string().contains("DOC_TRANSLATOR_RETRY_DELAY_SECS"));
    }

    #[test]
    fn test_rejects_unrepresentable_delay() {
        let err = TranslatorConfig::from_json(r#"{"engine": {"retryDelaySecs": 1e30}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "retryDelaySecs"));
    }

    #[test]
    fn test_unvalidated_delays_do_not_panic() {
        let config = EngineConfig {
            retry_delay_secs: 1e30,
            quota_exhaust_error_delay_secs: f64::INFINITY,
            request_delay_secs: f64::NAN,
            ..EngineConfig::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.retry_delay, Duration::MAX);
        assert_eq!(policy.quota_delay, Duration::MAX);
        assert_eq!(config.request_delay(), Duration::ZERO);

        let negative = EngineConfig {
            retry_delay_secs: -2.0,
            ..EngineConfig::default()
        };
        assert_eq!(negative.retry_delay(), Duration::ZERO);
    }

    #[test]
    fn test_without_delays() {
        let config = EngineConfig::default().without_delays();
        assert_eq!(config.retry_delay(), Duration::ZERO);
        assert_eq!(config.request_delay(), Duration::ZERO);
        assert_eq!(config.max_retries, 10);
    }
}
