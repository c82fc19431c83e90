//! Storage backends for the product registry and count ledger.

pub mod in_memory;
pub mod postgres;

pub use in_memory::MemStore;
pub use postgres::PgStore;

use estoque_counts::{Batch, Expiry};

/// What a bulk-import row did to the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// Existing product, name changed.
    Updated,
    /// Existing product, identical name. Counted as neither created nor
    /// updated in the import report.
    Unchanged,
}

/// A validated count submission, ready for the add-or-sum merge.
#[derive(Debug, Clone)]
pub struct CountSubmission {
    pub batch: Batch,
    pub expiry: Expiry,
    pub quantity: i64,
}
