use super::{LogRow, LogStore, NewLogEntry, StoreResult, into_entries};
use crate::db::PoolSettings;
use crate::query::{self, ListQuery, Placeholder};
use async_trait::async_trait;
use llm_log_protocol::LogEntry;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// `llm_call_logs` on a PostgreSQL server.
#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub async fn connect(options: PgConnectOptions, settings: &PoolSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(settings.max_lifetime)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations/postgres").run(&self.pool).await?;
        Ok(())
    }

    pub async fn insert(&self, entry: &NewLogEntry) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO llm_call_logs ("timestamp", status, input, output)
               VALUES ($1, $2, $3, $4) RETURNING id"#,
        )
        .bind(&entry.timestamp)
        .bind(entry.status.as_str())
        .bind(&entry.input)
        .bind(&entry.output)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn count(&self, query: &ListQuery) -> StoreResult<i64> {
        let sql = query.count_sql(Placeholder::Numbered);
        let mut stmt = sqlx::query_scalar::<_, i64>(&sql);
        for value in query.filter_values() {
            stmt = stmt.bind(value);
        }
        Ok(stmt.fetch_one(&self.pool).await?)
    }

    async fn fetch_page(&self, query: &ListQuery) -> StoreResult<Vec<LogEntry>> {
        let sql = query.page_sql(Placeholder::Numbered);
        let mut stmt = sqlx::query_as::<_, LogRow>(&sql);
        for value in query.filter_values() {
            stmt = stmt.bind(value);
        }
        let rows = stmt
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        into_entries(rows)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<LogEntry>> {
        let sql = query::find_by_id_sql(Placeholder::Numbered);
        sqlx::query_as::<_, LogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LogEntry::try_from)
            .transpose()
    }
}
