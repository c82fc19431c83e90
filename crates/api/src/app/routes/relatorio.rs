use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use estoque_counts::{summarize, StockSummary};
use estoque_report::ReportError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/resumo", get(resumo))
        .route("/pdf", get(pdf))
        .route("/excel", get(excel))
}

async fn load_summary(
    services: &AppServices,
    query: &dto::RelatorioQuery,
) -> estoque_core::DomainResult<StockSummary> {
    let include_zero_stock = query.incluir_zerados.unwrap_or(true);
    let (products, counts) = services.snapshot().await?;
    Ok(summarize(products, counts, include_zero_stock))
}

pub async fn resumo(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RelatorioQuery>,
) -> axum::response::Response {
    match load_summary(&services, &query).await {
        Ok(summary) => (StatusCode::OK, Json(dto::resumo_to_json(&summary))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn pdf(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RelatorioQuery>,
) -> axum::response::Response {
    let summary = match load_summary(&services, &query).await {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match estoque_report::render_pdf(&summary) {
        Ok(bytes) => document_response(bytes, "application/pdf", "pdf", &summary),
        Err(e) => report_failure(e),
    }
}

pub async fn excel(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RelatorioQuery>,
) -> axum::response::Response {
    let summary = match load_summary(&services, &query).await {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match estoque_report::render_excel(&summary) {
        Ok(bytes) => document_response(
            bytes,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
            &summary,
        ),
        Err(e) => report_failure(e),
    }
}

fn document_response(
    bytes: Vec<u8>,
    content_type: &str,
    extension: &str,
    summary: &StockSummary,
) -> axum::response::Response {
    let suffix = if summary.include_zero_stock {
        "todos"
    } else {
        "com_estoque"
    };
    let filename = format!(
        "relatorio_estoque_{}_{suffix}.{extension}",
        Utc::now().format("%Y-%m-%d")
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn report_failure(err: ReportError) -> axum::response::Response {
    tracing::error!("report rendering failed: {err}");
    errors::json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "report_error",
        "falha ao gerar relatório",
    )
}
