pub mod postgres;
pub mod sqlite;

pub use postgres::PgLogStore;
pub use sqlite::SqliteLogStore;

use crate::query::ListQuery;
use async_trait::async_trait;
use llm_log_protocol::{LogEntry, LogStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("row {id} has unexpected status '{status}'")]
    SchemaMismatch { id: i64, status: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the `llm_call_logs` table.
///
/// Implemented once per backend; handlers only ever see `dyn LogStore`.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Rows matching the query's filters, ignoring order and paging.
    async fn count(&self, query: &ListQuery) -> StoreResult<i64>;

    /// One page of rows in the query's order.
    async fn fetch_page(&self, query: &ListQuery) -> StoreResult<Vec<LogEntry>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<LogEntry>>;
}

/// Row as stored. `status` stays text until it is checked.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LogRow {
    pub id: i64,
    pub timestamp: String,
    pub status: String,
    pub input: String,
    pub output: String,
}

impl TryFrom<LogRow> for LogEntry {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<LogStatus>()
            .map_err(|_| StoreError::SchemaMismatch {
                id: row.id,
                status: row.status.clone(),
            })?;
        Ok(LogEntry {
            id: row.id,
            timestamp: row.timestamp,
            status,
            input: row.input,
            output: row.output,
        })
    }
}

pub(crate) fn into_entries(rows: Vec<LogRow>) -> StoreResult<Vec<LogEntry>> {
    rows.into_iter().map(LogEntry::try_from).collect()
}

/// A row to insert; used by the seed utility and tests, never by the API.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub timestamp: String,
    pub status: LogStatus,
    pub input: String,
    pub output: String,
}
