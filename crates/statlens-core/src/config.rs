use std::time::Duration;

use crate::{MarketSuffix, RetryConfig, ValidationError};

pub const ENV_DEFAULT_SUFFIX: &str = "STATLENS_DEFAULT_SUFFIX";
pub const ENV_TIMEOUT_MS: &str = "STATLENS_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "STATLENS_MAX_RETRIES";
pub const ENV_CACHE_TTL_SECS: &str = "STATLENS_CACHE_TTL_SECS";

/// Runtime settings for an [`Analyzer`](crate::Analyzer).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Suffix appended to bare symbols.
    pub default_suffix: MarketSuffix,
    /// Upper bound on a single fetch attempt.
    pub fetch_timeout: Duration,
    pub retry: RetryConfig,
    /// Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_suffix: MarketSuffix::Nse,
            fetch_timeout: Duration::from_millis(10_000),
            retry: RetryConfig::default(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overridden by `STATLENS_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEFAULT_SUFFIX) {
            config.default_suffix =
                MarketSuffix::parse(&raw).map_err(|_| ValidationError::InvalidConfig {
                    key: ENV_DEFAULT_SUFFIX,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = parse_number(ENV_TIMEOUT_MS, &raw)?;
            if millis == 0 {
                return Err(ValidationError::InvalidConfig {
                    key: ENV_TIMEOUT_MS,
                    value: raw,
                });
            }
            config.fetch_timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            let retries = parse_number(ENV_MAX_RETRIES, &raw)?;
            let retries = u32::try_from(retries).map_err(|_| ValidationError::InvalidConfig {
                key: ENV_MAX_RETRIES,
                value: raw.clone(),
            })?;
            config = config.with_max_retries(retries);
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_number(ENV_CACHE_TTL_SECS, &raw)?);
        }

        Ok(config)
    }

    pub fn with_default_suffix(mut self, suffix: MarketSuffix) -> Self {
        self.default_suffix = suffix;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = if max_retries == 0 {
            RetryConfig::no_retry()
        } else {
            RetryConfig {
                enabled: true,
                max_retries,
                ..self.retry
            }
        };
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ValidationError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidConfig {
            key,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AnalyzerConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_SUFFIX, "bo"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_MAX_RETRIES, "0"),
            (ENV_CACHE_TTL_SECS, "0"),
        ]))
        .expect("valid overrides");

        assert_eq!(config.default_suffix, MarketSuffix::Bse);
        assert_eq!(config.fetch_timeout, Duration::from_millis(2500));
        assert!(!config.retry.enabled);
        assert_eq!(config.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn invalid_values_name_their_key() {
        let error = AnalyzerConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")]))
            .expect_err("must fail");
        assert_eq!(
            error,
            ValidationError::InvalidConfig {
                key: ENV_TIMEOUT_MS,
                value: String::from("soon"),
            }
        );

        let error = AnalyzerConfig::from_lookup(lookup(&[(ENV_DEFAULT_SUFFIX, "nyse")]))
            .expect_err("must fail");
        assert!(matches!(
            error,
            ValidationError::InvalidConfig {
                key: ENV_DEFAULT_SUFFIX,
                ..
            }
        ));
    }
}
