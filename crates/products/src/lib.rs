//! `estoque-products` — product registry domain.
//!
//! Products are identified by a four-digit, zero-padded code. Names are
//! normalized (trimmed, uppercased) on write.

pub mod import;
pub mod product;

pub use import::{detect_columns, parse_rows, ImportError, ImportItem, ParsedRows};
pub use product::{Product, ProductCode, ProductId, ProductName};
