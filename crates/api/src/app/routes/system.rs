use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}
