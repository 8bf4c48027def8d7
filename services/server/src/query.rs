//! Translation of raw list parameters into a bounded, parameterized query plan.
//!
//! Every value that reaches SQL text (column names, sort direction) comes
//! from a fixed enum; request-supplied strings only ever travel as bind
//! parameters.

use llm_log_protocol::LogStatus;
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

const TABLE: &str = "llm_call_logs";
const SELECT_COLUMNS: &str = r#"id, "timestamp", status, input, output"#;

/// Raw query-string parameters for `GET /api/v1/llm-logs`.
///
/// Everything is kept as text so that type errors are reported by
/// [`ListQuery::from_params`] together with range errors.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Timestamp,
    Status,
    Id,
}

impl OrderBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "timestamp" => Some(Self::Timestamp),
            "status" => Some(Self::Status),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Timestamp => r#""timestamp""#,
            Self::Status => "status",
            Self::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One optional predicate of the WHERE conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Status(LogStatus),
    /// Inclusive lower bound on `timestamp`.
    StartTime(String),
    /// Inclusive upper bound on `timestamp`.
    EndTime(String),
}

impl Filter {
    fn lhs(&self) -> &'static str {
        match self {
            Filter::Status(_) => "status = ",
            Filter::StartTime(_) => r#""timestamp" >= "#,
            Filter::EndTime(_) => r#""timestamp" <= "#,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Filter::Status(s) => s.as_str(),
            Filter::StartTime(t) | Filter::EndTime(t) => t,
        }
    }
}

/// Bind-parameter syntax of the target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` (SQLite).
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
}

struct Binds {
    style: Placeholder,
    next: usize,
}

impl Binds {
    fn new(style: Placeholder) -> Self {
        Self { style, next: 1 }
    }

    fn push(&mut self, sql: &mut String) {
        match self.style {
            Placeholder::Question => sql.push('?'),
            Placeholder::Numbered => {
                sql.push('$');
                sql.push_str(&self.next.to_string());
            }
        }
        self.next += 1;
    }
}

/// Aggregated parameter validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid query parameters: {}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

/// Validated query plan for one page of log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub filters: Vec<Filter>,
    pub order_by: OrderBy,
    pub direction: Direction,
    offset: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filters: Vec::new(),
            order_by: OrderBy::Timestamp,
            direction: Direction::Desc,
            offset: 0,
        }
    }
}

/// Empty values behave exactly like absent ones.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Validate raw parameters. All problems are collected before failing so
    /// the caller sees every offending field at once.
    pub fn from_params(params: &ListParams) -> Result<Self, ValidationError> {
        let mut problems = Vec::new();
        let mut query = ListQuery::default();

        if let Some(raw) = present(params.page.as_deref()) {
            match raw.parse::<i64>() {
                Ok(page) if page >= 1 => query.page = page,
                Ok(_) => problems.push("page must be >= 1".to_owned()),
                Err(_) => problems.push(format!("page must be an integer, got '{raw}'")),
            }
        }

        if let Some(raw) = present(params.limit.as_deref()) {
            match raw.parse::<i64>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => query.limit = limit,
                Ok(_) => problems.push(format!("limit must be between 1 and {MAX_LIMIT}")),
                Err(_) => problems.push(format!("limit must be an integer, got '{raw}'")),
            }
        }

        if let Some(raw) = present(params.status.as_deref()) {
            match raw.parse::<LogStatus>() {
                Ok(status) => query.filters.push(Filter::Status(status)),
                Err(_) => problems.push(format!("status must be one of success|fail, got '{raw}'")),
            }
        }

        if let Some(start) = present(params.start_time.as_deref()) {
            query.filters.push(Filter::StartTime(start.to_owned()));
        }
        if let Some(end) = present(params.end_time.as_deref()) {
            query.filters.push(Filter::EndTime(end.to_owned()));
        }

        if let Some(raw) = present(params.order_by.as_deref()) {
            match OrderBy::parse(raw) {
                Some(order_by) => query.order_by = order_by,
                None => problems.push(format!(
                    "order_by must be one of timestamp|status|id, got '{raw}'"
                )),
            }
        }

        if let Some(raw) = present(params.order_direction.as_deref()) {
            match Direction::parse(raw) {
                Some(direction) => query.direction = direction,
                None => problems.push(format!(
                    "order_direction must be one of asc|desc, got '{raw}'"
                )),
            }
        }

        if !problems.is_empty() {
            return Err(ValidationError { problems });
        }

        query.offset = (query.page - 1)
            .checked_mul(query.limit)
            .ok_or_else(|| ValidationError {
                problems: vec![format!("page {} is too large", query.page)],
            })?;

        Ok(query)
    }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Values for the WHERE placeholders, in placeholder order.
    pub fn filter_values(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(Filter::value)
    }

    /// `SELECT COUNT(*)` over the same predicates, ignoring order and paging.
    pub fn count_sql(&self, style: Placeholder) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {TABLE}");
        let mut binds = Binds::new(style);
        self.push_where(&mut sql, &mut binds);
        sql
    }

    /// Page statement. Binds: filter values, then `limit`, then `offset`.
    pub fn page_sql(&self, style: Placeholder) -> String {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM {TABLE}");
        let mut binds = Binds::new(style);
        self.push_where(&mut sql, &mut binds);

        sql.push_str(" ORDER BY ");
        sql.push_str(self.order_by.column());
        sql.push(' ');
        sql.push_str(self.direction.keyword());
        // Ties on the primary key fall back to id so paging is stable.
        if self.order_by != OrderBy::Id {
            sql.push_str(", id ASC");
        }

        sql.push_str(" LIMIT ");
        binds.push(&mut sql);
        sql.push_str(" OFFSET ");
        binds.push(&mut sql);
        sql
    }

    fn push_where(&self, sql: &mut String, binds: &mut Binds) {
        for (i, filter) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(filter.lhs());
            binds.push(sql);
        }
    }
}

/// Statement for a primary-key lookup.
pub fn find_by_id_sql(style: Placeholder) -> String {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM {TABLE} WHERE id = ");
    Binds::new(style).push(&mut sql);
    sql
}
