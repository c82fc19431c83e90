//! Bulk-import parsing for the product registry.
//!
//! Input is a generic table (first row = header). Column detection is by
//! case-insensitive substring match against a small synonym set, falling back
//! to the first two columns. Row failures are collected, not fatal: the
//! import is partial-success by design.

use serde::Serialize;

use estoque_core::{DomainError, DomainResult};

use crate::product::{ProductCode, ProductName};

/// Header synonyms for the code column.
const CODE_COLUMNS: &[&str] = &["codigo", "código"];

/// Header synonyms for the name column.
const NAME_COLUMNS: &[&str] = &["nome", "produto", "descricao", "descrição"];

/// A row that failed validation. `row` is the 1-based spreadsheet row
/// (header included), matching what the user sees in their editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub row: usize,
    pub message: String,
}

/// A validated import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub row: usize,
    pub code: ProductCode,
    pub name: ProductName,
}

/// Outcome of parsing a table: validated rows plus per-row failures.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub items: Vec<ImportItem>,
    pub errors: Vec<ImportError>,
}

/// Locate the code and name columns in a header row.
///
/// Returns `(code_idx, name_idx)`. Falls back to the first two columns when
/// the synonyms do not match; fails when the table has fewer than two
/// columns.
pub fn detect_columns(headers: &[String]) -> DomainResult<(usize, usize)> {
    let mut code_col = None;
    let mut name_col = None;

    for (idx, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();
        if code_col.is_none() && CODE_COLUMNS.iter().any(|c| lower.contains(c)) {
            code_col = Some(idx);
        } else if name_col.is_none() && NAME_COLUMNS.iter().any(|c| lower.contains(c)) {
            name_col = Some(idx);
        }
    }

    match (code_col, name_col) {
        (Some(c), Some(n)) => Ok((c, n)),
        _ if headers.len() >= 2 => Ok((0, 1)),
        _ => Err(DomainError::invalid(
            "arquivo",
            "arquivo deve ter pelo menos 2 colunas (código e nome)",
        )),
    }
}

/// Parse a whole table (header row first) into validated import items.
///
/// Rows with an empty code or name cell are skipped silently (blank filler
/// rows are common in spreadsheets); rows with invalid values are reported
/// with their row number.
pub fn parse_rows(rows: &[Vec<String>]) -> DomainResult<ParsedRows> {
    let Some((header, data)) = rows.split_first() else {
        return Err(DomainError::invalid("arquivo", "arquivo está vazio"));
    };
    let (code_col, name_col) = detect_columns(header)?;

    let mut parsed = ParsedRows::default();
    for (idx, row) in data.iter().enumerate() {
        // Spreadsheet row number: 1-based, plus the header row.
        let row_number = idx + 2;

        let code_raw = row.get(code_col).map(|s| s.trim()).unwrap_or("");
        let name_raw = row.get(name_col).map(|s| s.trim()).unwrap_or("");
        if code_raw.is_empty() || name_raw.is_empty() {
            continue;
        }

        let code = match ProductCode::parse(code_raw) {
            Ok(code) => code,
            Err(e) => {
                parsed.errors.push(ImportError {
                    row: row_number,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let name = match ProductName::parse(name_raw) {
            Ok(name) => name,
            Err(e) => {
                parsed.errors.push(ImportError {
                    row: row_number,
                    message: e.to_string(),
                });
                continue;
            }
        };

        parsed.items.push(ImportItem {
            row: row_number,
            code,
            name,
        });
    }

    Ok(parsed)
}
