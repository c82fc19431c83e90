//! Decoding uploaded import files into a generic table.
//!
//! The import pipeline only understands `Vec<Vec<String>>` (header row
//! first); this module gets XLSX/XLS and CSV uploads into that shape.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use estoque_core::{DomainError, DomainResult};

/// Decode an uploaded file into rows of cells, dispatching on the file
/// extension.
pub fn rows_from_upload(filename: &str, data: &[u8]) -> DomainResult<Vec<Vec<String>>> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        rows_from_workbook(data)
    } else if lower.ends_with(".csv") {
        rows_from_csv(data)
    } else {
        Err(DomainError::invalid(
            "arquivo",
            "formato não suportado; envie .xlsx, .xls ou .csv",
        ))
    }
}

fn rows_from_workbook(data: &[u8]) -> DomainResult<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
        .map_err(|e| DomainError::invalid("arquivo", format!("planilha inválida: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DomainError::invalid("arquivo", "planilha não tem abas"))?
        .map_err(|e| DomainError::invalid("arquivo", format!("planilha inválida: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn rows_from_csv(data: &[u8]) -> DomainResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| DomainError::invalid("arquivo", format!("csv inválido: {e}")))?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

/// Spreadsheet cells carry types; codes typed as numbers come back as
/// floats (`12.0`), which must read as `"12"`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}
