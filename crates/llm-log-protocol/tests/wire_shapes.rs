//! Wire-shape tests: the JSON produced for each response body must match the
//! documented HTTP contract field-for-field.
use llm_log_protocol::{
    HealthResponse, HttpErrorEnvelope, LogEntry, LogListResponse, LogStatus,
};
use serde_json::json;

fn sample_entry(id: i64, status: LogStatus) -> LogEntry {
    LogEntry {
        id,
        timestamp: "2024-01-01T00:00:00Z".to_owned(),
        status,
        input: "prompt".to_owned(),
        output: "completion".to_owned(),
    }
}

#[test]
fn log_entry_serializes_with_lowercase_status() {
    let value = serde_json::to_value(sample_entry(1, LogStatus::Fail)).unwrap();
    assert_eq!(
        value,
        json!({
            "id": 1,
            "timestamp": "2024-01-01T00:00:00Z",
            "status": "fail",
            "input": "prompt",
            "output": "completion",
        })
    );
}

#[test]
fn log_entry_rejects_unknown_status() {
    let raw = json!({
        "id": 1,
        "timestamp": "t",
        "status": "pending",
        "input": "",
        "output": "",
    });
    assert!(serde_json::from_value::<LogEntry>(raw).is_err());
}

#[test]
fn empty_list_response_keeps_data_array() {
    let body = LogListResponse {
        data: vec![],
        total: 0,
        page: 3,
        limit: 20,
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value, json!({"data": [], "total": 0, "page": 3, "limit": 20}));
}

#[test]
fn health_response_is_status_ok() {
    let value = serde_json::to_value(HealthResponse::ok()).unwrap();
    assert_eq!(value, json!({"status": "ok"}));
}

#[test]
fn error_envelope_carries_code_and_error() {
    let body = HttpErrorEnvelope {
        code: "NOT_FOUND".to_owned(),
        error: "log not found".to_owned(),
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value, json!({"code": "NOT_FOUND", "error": "log not found"}));
}
