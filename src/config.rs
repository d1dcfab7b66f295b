//! Service configuration
//!
//! Defaults, overlaid by environment variables (after loading `.env` when
//! present). Keys map from upper-case env names: `GEMINI_API_KEY` ->
//! `gemini_api_key`.

use serde::Deserialize;
use std::time::Duration;

use crate::analysis::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Language-model API key. Optional: without one analysis requests fail
    /// individually and the rest of the portal works.
    pub gemini_api_key: Option<String>,
    /// Fallback name for the key
    pub api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub analysis_timeout_secs: u64,
}

impl Config {
    /// Load from `.env` and the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env(config::Environment::default())
    }

    /// Build from an explicit environment source
    pub fn from_env(env: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("port", DEFAULT_PORT as i64)?
            .set_default("gemini_model", DEFAULT_MODEL)?
            .set_default("gemini_base_url", DEFAULT_BASE_URL)?
            .set_default("analysis_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// The configured key, preferring `GEMINI_API_KEY`; blank values count
    /// as unset
    pub fn analysis_api_key(&self) -> Option<String> {
        self.gemini_api_key
            .iter()
            .chain(self.api_key.iter())
            .find(|k| !k.trim().is_empty())
            .cloned()
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_env(env(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.analysis_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.analysis_api_key().is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_env(env(&[
            ("PORT", "8088"),
            ("GEMINI_API_KEY", "key-1"),
            ("GEMINI_MODEL", "gemini-lite"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.gemini_model, "gemini-lite");
        assert_eq!(config.analysis_api_key().as_deref(), Some("key-1"));
    }

    #[test]
    fn test_api_key_fallback_and_blank_key() {
        let config =
            Config::from_env(env(&[("GEMINI_API_KEY", ""), ("API_KEY", "key-2")])).unwrap();
        assert_eq!(config.analysis_api_key().as_deref(), Some("key-2"));
    }
}
