//! Configuration loading and validation.

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Leaderboard paging and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// How long a ranked board may be served stale, e.g. "2m", "90s".
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    100
}

fn default_cache_ttl() -> String {
    "2m".to_string()
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl LeaderboardConfig {
    /// Parsed cache TTL. Falls back to two minutes if unparseable.
    pub fn cache_ttl(&self) -> Duration {
        parse_duration(&self.cache_ttl).unwrap_or(Duration::from_secs(120))
    }
}

/// Analytics thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Minimum results before weak/strong areas are inferred.
    #[serde(default = "default_insight_min_tests")]
    pub insight_min_tests: usize,

    #[serde(default = "default_recent_tests")]
    pub recent_tests: usize,

    /// Offset used for the "local hour" of a result. Unset means the
    /// server's local offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_insight_min_tests() -> usize {
    5
}

fn default_recent_tests() -> usize {
    5
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            insight_min_tests: default_insight_min_tests(),
            recent_tests: default_recent_tests(),
            utc_offset_minutes: None,
        }
    }
}

impl AnalyticsConfig {
    pub fn offset(&self) -> FixedOffset {
        match self
            .utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
        {
            Some(offset) => offset,
            None => Local::now().offset().fix(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        let lb = &self.leaderboard;
        if lb.default_page_size == 0 || lb.max_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "Leaderboard page sizes must be greater than 0".to_string(),
            ));
        }
        if lb.default_page_size > lb.max_page_size {
            return Err(ConfigError::ValidationError(format!(
                "Default page size {} exceeds max page size {}",
                lb.default_page_size, lb.max_page_size
            )));
        }
        if parse_duration(&lb.cache_ttl).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid leaderboard cache_ttl: {:?}",
                lb.cache_ttl
            )));
        }

        if let Some(minutes) = self.analytics.utc_offset_minutes {
            if FixedOffset::east_opt(minutes * 60).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.leaderboard.default_page_size, 50);
        assert_eq!(config.leaderboard.max_page_size, 100);
        assert_eq!(config.analytics.insight_min_tests, 5);
        assert_eq!(config.analytics.recent_tests, 5);
    }

    #[test]
    fn test_cache_ttl_parsed() {
        let config = LeaderboardConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_page_sizes() {
        let mut config = AppConfig::default();
        config.leaderboard.default_page_size = 200;
        assert!(config.validate().is_err());

        config.leaderboard.default_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_ttl_and_offset() {
        let mut config = AppConfig::default();
        config.leaderboard.cache_ttl = "soon".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analytics.utc_offset_minutes = Some(24 * 60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_offset_used_when_configured() {
        let analytics = AnalyticsConfig {
            utc_offset_minutes: Some(-300),
            ..AnalyticsConfig::default()
        };
        assert_eq!(analytics.offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/keysprint"

            [leaderboard]
            cache_ttl = "30s"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/keysprint"));
        assert_eq!(config.leaderboard.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.leaderboard.max_page_size, 100);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
    }
}
