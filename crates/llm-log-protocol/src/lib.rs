// llm-log-protocol: HTTP wire types for the LLM call-log API.
//
// Shared by the server, the seed utility and the integration tests so the
// JSON shapes are defined in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Log records
// ---------------------------------------------------------------------------

/// Outcome of a single model invocation.
///
/// Storage enforces the same two values with a check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Fail,
}

impl LogStatus {
    pub const ALL: [LogStatus; 2] = [LogStatus::Success, LogStatus::Fail];

    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log status '{0}'; expected success|fail")]
pub struct UnknownStatus(pub String);

impl FromStr for LogStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LogStatus::Success),
            "fail" => Ok(LogStatus::Fail),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// One recorded model invocation as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    /// Stored as text; not validated beyond presence.
    pub timestamp: String,
    pub status: LogStatus,
    pub input: String,
    pub output: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Response body for `GET /api/v1/llm-logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogListResponse {
    pub data: Vec<LogEntry>,
    /// Rows matching the filters, independent of paging.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_owned(),
        }
    }
}

/// Error envelope used by all non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorEnvelope {
    pub code: String,
    pub error: String,
}
