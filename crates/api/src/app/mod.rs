//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: storage backend selection and async dispatch
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses
//! - `upload.rs`: spreadsheet/CSV decoding for the bulk import

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod upload;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/produtos", routes::produtos::router())
        .nest("/contagens", routes::contagens::router())
        .nest("/relatorio", routes::relatorio::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
