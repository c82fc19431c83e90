//! Request DTOs and JSON mapping helpers.
//!
//! Clients (spreadsheet-driven frontends included) send codes and quantities
//! as either JSON numbers or strings; [`Flex`] accepts both and the domain
//! types do the validation.

use serde::Deserialize;
use serde_json::{json, Value};

use estoque_core::{DomainError, DomainResult};
use estoque_counts::{CountRecord, StockSummary};
use estoque_products::Product;

/// A JSON value that may arrive as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Flex {
    Number(i64),
    Text(String),
}

impl Flex {
    /// Raw textual form, for fields parsed by a domain constructor.
    pub fn as_text(&self) -> String {
        match self {
            Flex::Number(n) => n.to_string(),
            Flex::Text(s) => s.clone(),
        }
    }

    /// Integer form, for numeric fields.
    pub fn as_i64(&self, field: &'static str) -> DomainResult<i64> {
        match self {
            Flex::Number(n) => Ok(*n),
            Flex::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| DomainError::invalid(field, format!("{field} deve ser numérico"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProdutoRequest {
    pub codigo: Flex,
    pub nome: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProdutoRequest {
    pub codigo: Option<Flex>,
    pub nome: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrarContagemRequest {
    pub codigo_produto: Flex,
    pub lote: String,
    pub validade_mes: Flex,
    pub validade_ano: Flex,
    pub quantidade: Flex,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarContagemRequest {
    pub lote: String,
    pub validade_mes: Flex,
    pub validade_ano: Flex,
    pub quantidade: Flex,
}

#[derive(Debug, Deserialize)]
pub struct ZerarRequest {
    pub confirmar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelatorioQuery {
    pub incluir_zerados: Option<bool>,
}

pub fn produto_to_json(product: &Product) -> Value {
    json!({
        "id": product.id.to_string(),
        "codigo": product.code.as_str(),
        "nome": product.name.as_str(),
        "created_at": product.created_at.to_rfc3339(),
    })
}

pub fn contagem_to_json(count: &CountRecord) -> Value {
    json!({
        "id": count.id.to_string(),
        "produto_id": count.product_id.to_string(),
        "lote": count.batch.as_str(),
        "validade_mes": count.expiry.month,
        "validade_ano": count.expiry.year,
        "validade_formatada": count.expiry.to_string(),
        "quantidade": count.quantity,
        "created_at": count.created_at.to_rfc3339(),
        "updated_at": count.updated_at.to_rfc3339(),
    })
}

pub fn resumo_to_json(summary: &StockSummary) -> Value {
    let itens = summary
        .items
        .iter()
        .map(|item| {
            json!({
                "produto": produto_to_json(&item.product),
                "contagens": item.entries.iter().map(contagem_to_json).collect::<Vec<_>>(),
                "total_quantidade": item.total_quantity,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "resumo": itens,
        "total_geral": summary.total_quantity,
        "total_produtos": summary.product_count,
        "incluir_zerados": summary.include_zero_stock,
        "data_geracao": summary.generated_at.to_rfc3339(),
    })
}
