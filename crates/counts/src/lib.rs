//! `estoque-counts` — count ledger domain.
//!
//! One `CountRecord` per (product, batch) pair. The central rule is
//! add-or-sum: a submission for an existing pair increments the stored
//! quantity instead of creating a duplicate. Aggregation over the ledger is
//! a pure fold in [`summary`].

pub mod entry;
pub mod summary;

pub use entry::{validate_quantity, Batch, CountId, CountRecord, Expiry};
pub use summary::{summarize, ProductSummary, StockSummary};
