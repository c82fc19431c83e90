use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use estoque_core::RecordId;
use estoque_products::{parse_rows, ProductCode, ProductId, ProductName};
use estoque_infra::UpsertOutcome;

use crate::app::services::AppServices;
use crate::app::{dto, errors, upload};

pub fn router() -> Router {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/importar", post(importar))
        .route("/template", get(template))
        .route("/:chave", get(buscar).put(atualizar).delete(excluir))
}

pub async fn listar(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = match services.list_products().await {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let items = products.iter().map(dto::produto_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "produtos": items }))).into_response()
}

pub async fn criar(
    Extension(services): Extension<Arc<AppServices>>,
    errors::JsonBody(body): errors::JsonBody<dto::CreateProdutoRequest>,
) -> axum::response::Response {
    let code = match ProductCode::parse(&body.codigo.as_text()) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let name = match ProductName::parse(&body.nome) {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_product(code, name).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "produto": dto::produto_to_json(&product) })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn buscar(
    Extension(services): Extension<Arc<AppServices>>,
    Path(codigo): Path<String>,
) -> axum::response::Response {
    let code = match ProductCode::parse(&codigo) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.find_product(&code).await {
        Ok(Some(product)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "produto": dto::produto_to_json(&product) })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "produto não encontrado"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn atualizar(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    errors::JsonBody(body): errors::JsonBody<dto::UpdateProdutoRequest>,
) -> axum::response::Response {
    let id: RecordId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "id inválido"),
    };

    let code = match body.codigo.map(|c| ProductCode::parse(&c.as_text())).transpose() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let name = match body.nome.map(|n| ProductName::parse(&n)).transpose() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_product(ProductId::new(id), code, name).await {
        Ok(product) => (
            StatusCode::OK,
            Json(serde_json::json!({ "produto": dto::produto_to_json(&product) })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn excluir(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RecordId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "id inválido"),
    };

    match services.delete_product(ProductId::new(id)).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "mensagem": "produto e contagens excluídos" })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn importar(
    Extension(services): Extension<Arc<AppServices>>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                // The upload contract names the file field "arquivo";
                // anything else in the form is ignored.
                if field.name() != Some("arquivo") {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        return errors::json_error(
                            StatusCode::BAD_REQUEST,
                            "invalid_upload",
                            e.to_string(),
                        )
                    }
                }
                break;
            }
            Ok(None) => break,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", e.to_string())
            }
        }
    }
    let Some((filename, data)) = file else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_upload",
            "nenhum arquivo enviado no campo 'arquivo'",
        );
    };

    let rows = match upload::rows_from_upload(&filename, &data) {
        Ok(rows) => rows,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let parsed = match parse_rows(&rows) {
        Ok(parsed) => parsed,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut created = 0u64;
    let mut updated = 0u64;
    let mut erros = parsed
        .errors
        .iter()
        .map(|e| serde_json::json!({ "linha": e.row, "mensagem": e.message }))
        .collect::<Vec<_>>();

    for item in parsed.items {
        match services.upsert_product_name(item.code, item.name).await {
            Ok(UpsertOutcome::Created) => created += 1,
            Ok(UpsertOutcome::Updated) => updated += 1,
            Ok(UpsertOutcome::Unchanged) => {}
            Err(e) => erros.push(serde_json::json!({
                "linha": item.row,
                "mensagem": e.to_string(),
            })),
        }
    }

    let total_erros = erros.len();
    tracing::info!(created, updated, errors = total_erros, "import finished");

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "criados": created,
            "atualizados": updated,
            "erros": erros,
            "total_erros": total_erros,
        })),
    )
        .into_response()
}

pub async fn template() -> axum::response::Response {
    match estoque_report::import_template() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                        .to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"modelo_importacao_produtos.xlsx\"".to_string(),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("template rendering failed: {e}");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "report_error",
                "falha ao gerar modelo",
            )
        }
    }
}
