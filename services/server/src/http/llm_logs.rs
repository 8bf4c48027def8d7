use super::response::{HttpResponse, HttpResult, bad_request, internal_error, not_found};
use crate::query::{ListParams, ListQuery};
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use llm_log_protocol::LogListResponse;
use tracing::{debug, error};

/// GET /api/v1/llm-logs
pub async fn list_llm_logs(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> HttpResponse {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => {
            debug!(error = %rejection, "rejected llm-logs query string");
            return bad_request(format!(
                "invalid query parameters: {}",
                rejection.body_text()
            ));
        }
    };

    let query = match ListQuery::from_params(&params) {
        Ok(q) => q,
        Err(e) => {
            debug!(error = %e, "rejected llm-logs parameters");
            return bad_request(e.to_string());
        }
    };

    let total = match state.store.count(&query).await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, "counting llm logs failed");
            return internal_error("failed to count records");
        }
    };

    let data = match state.store.fetch_page(&query).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, page = query.page, limit = query.limit, "fetching llm logs failed");
            return internal_error("failed to fetch records");
        }
    };

    (
        StatusCode::OK,
        Json(LogListResponse {
            data,
            total,
            page: query.page,
            limit: query.limit,
        }),
    )
        .into_response()
}

/// GET /api/v1/llm-logs/{id}
pub async fn get_llm_log(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> HttpResponse {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.find_by_id(id).await {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => not_found("log not found"),
        Err(e) => {
            error!(error = %e, id, "fetching llm log failed");
            internal_error("failed to fetch record")
        }
    }
}

fn parse_id(raw: Result<Path<String>, PathRejection>) -> HttpResult<i64> {
    let Ok(Path(raw)) = raw else {
        return Err(bad_request("invalid id format"));
    };
    raw.parse::<i64>().map_err(|_| {
        debug!(id = %raw, "rejected non-numeric llm log id");
        bad_request("invalid id format")
    })
}
