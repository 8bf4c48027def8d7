pub mod config;
pub mod db;
pub mod http;
pub mod query;
pub mod repo;
pub mod state;

pub use state::AppState;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::get,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/llm-logs", get(http::llm_logs::list_llm_logs))
        .route("/api/v1/llm-logs/{id}", get(http::llm_logs::get_llm_log))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    const ALLOWED_HEADERS: [HeaderName; 4] = [
        header::ORIGIN,
        header::CONTENT_LENGTH,
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
    ];
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers(ALLOWED_HEADERS)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

mod health {
    use axum::Json;
    use llm_log_protocol::HealthResponse;

    pub async fn health() -> Json<HealthResponse> {
        Json(HealthResponse::ok())
    }
}
