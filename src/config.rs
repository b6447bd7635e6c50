//! Environment-driven configuration.
//!
//! `load` reads the process environment (after `.env` has been applied by
//! [`crate::bootstrap::init_env`]); `from_lookup` takes any key lookup so the
//! parsing rules can be exercised without touching the real environment.

use std::{path::PathBuf, str::FromStr};

use crate::app_error::{AppError, AppResult};

const DEFAULT_SOURCE_BASE_URL: &str = "https://dummyjson.com";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    /// Postgres warehouse; `None` selects the file sink.
    pub database: Option<DatabaseConfig>,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub base_url: String,
    /// Sent as `?limit=N`. The dummyjson service treats `0` as "everything".
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

pub fn load() -> AppResult<AppConfig> {
    AppConfig::from_lookup(|key| std::env::var(key).ok())
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let source = SourceConfig {
            base_url: get("SOURCE_BASE_URL").unwrap_or_else(|| DEFAULT_SOURCE_BASE_URL.to_string()),
            limit: get("SOURCE_LIMIT")
                .map(|raw| parse("SOURCE_LIMIT", &raw))
                .transpose()?,
        };

        let storage = StorageConfig {
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        };

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: get("DATABASE_MAX_CONNECTIONS")
                    .map(|raw| parse("DATABASE_MAX_CONNECTIONS", &raw))
                    .transpose()?
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
            }),
            None => None,
        };

        Ok(Self {
            source,
            storage,
            database,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got `{raw}`")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.source.base_url, "https://dummyjson.com");
        assert_eq!(config.source.limit, None);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert!(config.database.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn database_url_enables_the_warehouse() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://etl@localhost/warehouse"),
            ("DATABASE_MAX_CONNECTIONS", "8"),
            ("SOURCE_LIMIT", "0"),
        ])
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://etl@localhost/warehouse");
        assert_eq!(database.max_connections, 8);
        assert_eq!(config.source.limit, Some(0));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("DATABASE_URL", "  "), ("DATA_DIR", "")]).unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn invalid_limit_is_rejected() {
        let err = config_from(&[("SOURCE_LIMIT", "all")]).unwrap_err();

        assert!(matches!(err, AppError::Config(msg) if msg.contains("SOURCE_LIMIT")));
    }
}
