use serde::Deserialize;
use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, Environment};
use url::Url;

use crate::error::{AppError, Result};
use crate::limiter::period::PeriodUnit;

pub const DEFAULT_API_URL: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";
const ENV_PREFIX: &str = "CRPT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // General
    pub log_level: String,

    // Registry
    pub api_url: String,
    pub signature: String,

    // Rate limit, checked in `validate`
    pub request_limit: i64,
    pub time_unit: String,

    // HTTP
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub https_only: bool,
}

impl Config {
    /// Defaults, overridden by `CRPT_*` environment variables. A `.env` file
    /// is read first if one exists.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    pub fn from_env(env: Environment) -> Result<Self> {
        let config: Config = Self::defaults()?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = ConfigLoader::builder()
            .set_default("log_level", "info")?
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("signature", "test")?
            .set_default("request_limit", 10_i64)?
            .set_default("time_unit", "seconds")?
            .set_default("connect_timeout_ms", 2_000_i64)?
            .set_default("request_timeout_ms", 10_000_i64)?
            .set_default("https_only", true)?;
        Ok(builder)
    }

    fn validate(&self) -> Result<()> {
        if self.request_limit <= 0 {
            return Err(AppError::config(format!(
                "request_limit must be positive, got {}",
                self.request_limit
            )));
        }
        self.period_unit()?;
        self.api_url()?;
        Ok(())
    }

    pub fn period_unit(&self) -> Result<PeriodUnit> {
        self.time_unit.parse()
    }

    pub fn api_url(&self) -> Result<Url> {
        Url::parse(&self.api_url)
            .map_err(|e| AppError::config(format!("Invalid API URL {}: {}", self.api_url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env(env(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_limit, 10);
        assert_eq!(config.period_unit().unwrap(), PeriodUnit::Seconds);
        assert!(config.https_only);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_env(env(&[
            ("CRPT_REQUEST_LIMIT", "3"),
            ("CRPT_TIME_UNIT", "MINUTES"),
            ("CRPT_HTTPS_ONLY", "false"),
            ("CRPT_API_URL", "http://127.0.0.1:8080/create"),
        ]))
        .unwrap();

        assert_eq!(config.request_limit, 3);
        assert_eq!(config.period_unit().unwrap(), PeriodUnit::Minutes);
        assert!(!config.https_only);
        assert_eq!(config.api_url().unwrap().port(), Some(8080));
    }

    #[test]
    fn test_rejects_bad_limits() {
        for limit in ["0", "-4"] {
            let err = Config::from_env(env(&[("CRPT_REQUEST_LIMIT", limit)])).unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        }
    }

    #[test]
    fn test_rejects_unsupported_unit() {
        let err = Config::from_env(env(&[("CRPT_TIME_UNIT", "days")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = Config::from_env(env(&[("CRPT_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
