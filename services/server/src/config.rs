//! Server configuration loading.
//!
//! Environment variables are the only config source (a `.env` file is loaded
//! into the environment by `main` before this runs).
//!
//! # Storage selection
//! 1. `DATABASE_URL` (`postgres://`, `postgresql://`, `sqlite:` or `sqlite://`)
//! 2. `DB_HOST` + `DB_PORT` + `DB_NAME` + `DB_USER` + `DB_PASSWORD` (PostgreSQL)
//! 3. `DATABASE_PATH`, defaulting to the bot's SQLite file

use crate::db::PoolSettings;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SQLITE_PATH: &str = "../kagami-bot/data/kagami.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_level: String,
    pub storage: StorageConfig,
    pub pool: PoolSettings,
    /// Apply schema migrations before serving.
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Sqlite { path: PathBuf },
    Postgres(PostgresTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostgresTarget {
    Url(String),
    Params {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: String,
    },
}

impl StorageConfig {
    /// Human-readable target without credentials, for logs.
    pub fn describe(&self) -> String {
        match self {
            StorageConfig::Sqlite { path } => format!("sqlite {}", path.display()),
            StorageConfig::Postgres(PostgresTarget::Url(_)) => "postgres (DATABASE_URL)".to_owned(),
            StorageConfig::Postgres(PostgresTarget::Params {
                host,
                port,
                database,
                ..
            }) => format!("postgres {host}:{port}/{database}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingField(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = storage_from_lookup(&get)?;

        let defaults = PoolSettings::default();
        let max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let min_connections = parse_or(
            &get,
            "DB_MIN_CONNECTIONS",
            defaults.min_connections.min(max_connections),
        )?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_CONNECTIONS must be at least 1".to_owned(),
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidValue(format!(
                "DB_MIN_CONNECTIONS ({min_connections}) exceeds DB_MAX_CONNECTIONS ({max_connections})"
            )));
        }
        let max_lifetime = Duration::from_secs(parse_or(
            &get,
            "DB_MAX_LIFETIME_SECS",
            defaults.max_lifetime.as_secs(),
        )?);
        let acquire_timeout = Duration::from_secs(parse_or(
            &get,
            "DB_ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout.as_secs(),
        )?);

        let auto_migrate = match get("AUTO_MIGRATE").as_deref() {
            None => false,
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "AUTO_MIGRATE must be true or false, got '{other}'"
                )));
            }
        };

        Ok(ServerConfig {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            storage,
            pool: PoolSettings {
                max_connections,
                min_connections,
                max_lifetime,
                acquire_timeout,
            },
            auto_migrate,
        })
    }
}

fn storage_from_lookup<G>(get: &G) -> Result<StorageConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(StorageConfig::Postgres(PostgresTarget::Url(url)));
        }
        if let Some(rest) = url.strip_prefix("sqlite:") {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "DATABASE_URL has an empty sqlite path".to_owned(),
                ));
            }
            return Ok(StorageConfig::Sqlite {
                path: PathBuf::from(path),
            });
        }
        return Err(ConfigError::InvalidValue(
            "DATABASE_URL must start with postgres://, postgresql:// or sqlite:".to_owned(),
        ));
    }

    if let Some(host) = get("DB_HOST") {
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingField(key.to_owned()));
        let raw_port = require("DB_PORT")?;
        let port = raw_port.parse::<u16>().map_err(|_| {
            ConfigError::InvalidValue(format!("DB_PORT must be a port number, got '{raw_port}'"))
        })?;
        return Ok(StorageConfig::Postgres(PostgresTarget::Params {
            host,
            port,
            database: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
        }));
    }

    Ok(StorageConfig::Sqlite {
        path: PathBuf::from(get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_owned())),
    })
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_use_bot_sqlite_file() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(
            cfg.storage,
            StorageConfig::Sqlite {
                path: PathBuf::from(DEFAULT_SQLITE_PATH)
            }
        );
        assert_eq!(cfg.pool, PoolSettings::default());
        assert!(!cfg.auto_migrate);
    }

    #[test]
    fn postgres_params_require_every_field() {
        let err = load(&[("DB_HOST", "db"), ("DB_PORT", "5432"), ("DB_NAME", "logs")])
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingField("DB_USER".to_owned()));
    }

    #[test]
    fn postgres_params_are_collected() {
        let cfg = load(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "kagami"),
            ("DB_USER", "reader"),
            ("DB_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres(PostgresTarget::Params {
                host: "db.internal".to_owned(),
                port: 6543,
                database: "kagami".to_owned(),
                user: "reader".to_owned(),
                password: "secret".to_owned(),
            })
        );
        assert_eq!(cfg.storage.describe(), "postgres db.internal:6543/kagami");
    }

    #[test]
    fn bad_port_is_invalid_value() {
        let err = load(&[
            ("DB_HOST", "db"),
            ("DB_PORT", "http"),
            ("DB_NAME", "n"),
            ("DB_USER", "u"),
            ("DB_PASSWORD", "p"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn database_url_takes_precedence() {
        let cfg = load(&[
            ("DATABASE_URL", "sqlite:///tmp/logs.db"),
            ("DB_HOST", "ignored"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Sqlite {
                path: PathBuf::from("/tmp/logs.db")
            }
        );

        let cfg = load(&[("DATABASE_URL", "postgres://u:p@h/db")]).unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres(PostgresTarget::Url("postgres://u:p@h/db".to_owned()))
        );
        assert_eq!(cfg.storage.describe(), "postgres (DATABASE_URL)");
    }

    #[test]
    fn unsupported_database_url_is_rejected() {
        let err = load(&[("DATABASE_URL", "mysql://h/db")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn pool_settings_are_validated() {
        let cfg = load(&[
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_MAX_LIFETIME_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(cfg.pool.max_connections, 4);
        assert_eq!(cfg.pool.min_connections, 2);
        assert_eq!(cfg.pool.max_lifetime, Duration::from_secs(60));

        // The warm reserve shrinks to fit a small cap unless set explicitly.
        assert_eq!(load(&[("DB_MAX_CONNECTIONS", "3")]).unwrap().pool.min_connections, 3);
        assert!(load(&[("DB_MAX_CONNECTIONS", "2"), ("DB_MIN_CONNECTIONS", "3")]).is_err());
        assert!(load(&[("DB_MAX_CONNECTIONS", "0"), ("DB_MIN_CONNECTIONS", "0")]).is_err());
        assert!(load(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }

    #[test]
    fn auto_migrate_flag_parses() {
        assert!(load(&[("AUTO_MIGRATE", "true")]).unwrap().auto_migrate);
        assert!(!load(&[("AUTO_MIGRATE", "0")]).unwrap().auto_migrate);
        assert!(load(&[("AUTO_MIGRATE", "sometimes")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = load(&[("BIND_ADDR", "  "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert!(matches!(cfg.storage, StorageConfig::Sqlite { .. }));
    }
}
