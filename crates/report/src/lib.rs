//! `estoque-report` — document rendering for stock summaries.
//!
//! Consumes the aggregation result (`StockSummary`) and renders it as a PDF
//! or a styled XLSX workbook. Also produces the import template spreadsheet.
//! Binary layout of the documents is presentation, not contract.

pub mod excel;
pub mod pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pdf: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub use excel::{import_template, render_excel};
pub use pdf::render_pdf;
