use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use estoque_core::RecordId;
use estoque_counts::{validate_quantity, Batch, CountId, Expiry};
use estoque_infra::CountSubmission;
use estoque_products::ProductCode;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Confirmation token for the wipe-everything endpoint.
const CLEAR_CONFIRMATION: &str = "SIM_ZERAR_TUDO";

pub fn router() -> Router {
    Router::new()
        .route("/", get(listar).post(registrar))
        .route("/zerar", post(zerar))
        .route("/produto/:codigo", get(por_produto))
        .route("/:id", get(buscar).put(atualizar).delete(excluir))
}

pub async fn listar(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let rows = match services.list_counts().await {
        Ok(rows) => rows,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let items = rows
        .iter()
        .map(|(count, product)| {
            let mut item = dto::contagem_to_json(count);
            item["produto"] = dto::produto_to_json(product);
            item
        })
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "contagens": items }))).into_response()
}

pub async fn registrar(
    Extension(services): Extension<Arc<AppServices>>,
    errors::JsonBody(body): errors::JsonBody<dto::RegistrarContagemRequest>,
) -> axum::response::Response {
    let submission = match build_submission(
        &body.lote,
        &body.validade_mes,
        &body.validade_ano,
        &body.quantidade,
    ) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let code = match ProductCode::parse(&body.codigo_produto.as_text()) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let added = submission.quantity;
    match services.record_count(&code, submission).await {
        Ok((product, count, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (
                status,
                Json(serde_json::json!({
                    "contagem": dto::contagem_to_json(&count),
                    "produto": dto::produto_to_json(&product),
                    "criou_novo": created,
                    "quantidade_adicionada": added,
                })),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn por_produto(
    Extension(services): Extension<Arc<AppServices>>,
    Path(codigo): Path<String>,
) -> axum::response::Response {
    let code = match ProductCode::parse(&codigo) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.counts_for_product(&code).await {
        Ok((product, counts)) => {
            let total: i64 = counts.iter().map(|c| c.quantity).sum();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "produto": dto::produto_to_json(&product),
                    "contagens": counts.iter().map(dto::contagem_to_json).collect::<Vec<_>>(),
                    "total_quantidade": total,
                })),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn buscar(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_count_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.get_count(id).await {
        Ok((count, product)) => {
            let mut item = dto::contagem_to_json(&count);
            item["produto"] = dto::produto_to_json(&product);
            (StatusCode::OK, Json(serde_json::json!({ "contagem": item }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn atualizar(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    errors::JsonBody(body): errors::JsonBody<dto::AtualizarContagemRequest>,
) -> axum::response::Response {
    let id = match parse_count_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let submission = match build_submission(
        &body.lote,
        &body.validade_mes,
        &body.validade_ano,
        &body.quantidade,
    ) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .update_count(id, submission.batch, submission.expiry, submission.quantity)
        .await
    {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({ "contagem": dto::contagem_to_json(&count) })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn excluir(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_count_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.delete_count(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "mensagem": "contagem excluída" })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn zerar(
    Extension(services): Extension<Arc<AppServices>>,
    errors::JsonBody(body): errors::JsonBody<dto::ZerarRequest>,
) -> axum::response::Response {
    if body.confirmar.as_deref() != Some(CLEAR_CONFIRMATION) {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "confirmation_required",
            format!("envie {{\"confirmar\": \"{CLEAR_CONFIRMATION}\"}} para zerar todas as contagens"),
        );
    }

    match services.clear_counts().await {
        Ok(removed) => {
            tracing::warn!(removed, "all count entries cleared");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "excluidas": removed })),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn build_submission(
    lote: &str,
    mes: &dto::Flex,
    ano: &dto::Flex,
    quantidade: &dto::Flex,
) -> estoque_core::DomainResult<CountSubmission> {
    let batch = Batch::parse(lote)?;
    let expiry = Expiry::new(
        mes.as_i64("validade_mes")?,
        ano.as_i64("validade_ano")?,
    )?;
    let quantity = validate_quantity(quantidade.as_i64("quantidade")?)?;
    Ok(CountSubmission {
        batch,
        expiry,
        quantity,
    })
}

fn parse_count_id(raw: &str) -> Result<CountId, axum::response::Response> {
    raw.parse::<RecordId>()
        .map(CountId::new)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "id inválido"))
}
