use crate::config::{PostgresTarget, StorageConfig};
use crate::repo::{LogStore, NewLogEntry, PgLogStore, SqliteLogStore, StoreResult};
use sqlx::postgres::PgConnectOptions;
use std::sync::Arc;
use std::time::Duration;

/// Bounds for the shared connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 5,
            max_lifetime: Duration::from_secs(3600),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Whether opening storage may create a missing SQLite file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Serving path: the database must already exist.
    Existing,
    /// Seed utility: create the file (and parent directories) when absent.
    Create,
}

/// The configured backend. Serving only needs the [`LogStore`] view; schema
/// and insert operations are for the seed utility and tests.
#[derive(Clone)]
pub enum Storage {
    Sqlite(SqliteLogStore),
    Postgres(PgLogStore),
}

impl Storage {
    pub async fn open(
        config: &StorageConfig,
        pool: &PoolSettings,
        mode: OpenMode,
    ) -> StoreResult<Self> {
        match config {
            StorageConfig::Sqlite { path } => {
                let create = mode == OpenMode::Create;
                if create {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
                    }
                }
                Ok(Storage::Sqlite(
                    SqliteLogStore::connect(path, pool, create).await?,
                ))
            }
            StorageConfig::Postgres(target) => {
                let options = pg_connect_options(target)?;
                Ok(Storage::Postgres(PgLogStore::connect(options, pool).await?))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Sqlite(_) => "sqlite",
            Storage::Postgres(_) => "postgres",
        }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        match self {
            Storage::Sqlite(store) => store.migrate().await,
            Storage::Postgres(store) => store.migrate().await,
        }
    }

    pub async fn insert(&self, entry: &NewLogEntry) -> StoreResult<i64> {
        match self {
            Storage::Sqlite(store) => store.insert(entry).await,
            Storage::Postgres(store) => store.insert(entry).await,
        }
    }

    pub fn into_log_store(self) -> Arc<dyn LogStore> {
        match self {
            Storage::Sqlite(store) => Arc::new(store),
            Storage::Postgres(store) => Arc::new(store),
        }
    }
}

fn pg_connect_options(target: &PostgresTarget) -> Result<PgConnectOptions, sqlx::Error> {
    match target {
        PostgresTarget::Url(url) => url.parse::<PgConnectOptions>(),
        PostgresTarget::Params {
            host,
            port,
            database,
            user,
            password,
        } => Ok(PgConnectOptions::new()
            .host(host)
            .port(*port)
            .database(database)
            .username(user)
            .password(password)),
    }
}
