use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use estoque_core::DomainError;

/// JSON body extractor that reports malformed input in the same
/// `{"error", "message"}` shape as every other failure, instead of axum's
/// plain-text rejection.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                rejection.body_text(),
            )),
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        DomainError::InvalidArgument { .. } => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        DomainError::Internal(ref msg) => {
            // Storage details stay in the logs, not the response body.
            tracing::error!("internal error: {msg}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "falha interna",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
