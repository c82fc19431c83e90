use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estoque_core::{DomainError, DomainResult, RecordId};
use estoque_products::ProductId;

/// Count entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountId(pub RecordId);

impl CountId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Batch ("lote") identifier, normalized (trimmed, uppercased) on
/// construction. Comparison and storage always use the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch(String);

impl Batch {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::invalid("lote", "lote é obrigatório"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Batch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expiration month/year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    pub month: u8,
    pub year: u16,
}

impl Expiry {
    pub fn new(month: i64, year: i64) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::invalid(
                "validade_mes",
                "mês deve estar entre 1 e 12",
            ));
        }
        if !(2000..=2099).contains(&year) {
            return Err(DomainError::invalid(
                "validade_ano",
                "ano deve estar entre 2000 e 2099",
            ));
        }
        Ok(Self {
            month: month as u8,
            year: year as u16,
        })
    }
}

impl core::fmt::Display for Expiry {
    /// `MM/YYYY`, the format used everywhere the expiry is shown.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Validate a submitted quantity (non-negative).
pub fn validate_quantity(quantity: i64) -> DomainResult<i64> {
    if quantity < 0 {
        return Err(DomainError::invalid(
            "quantidade",
            "quantidade não pode ser negativa",
        ));
    }
    Ok(quantity)
}

/// A per-batch count for one product.
///
/// Invariant: at most one record exists per (product_id, batch) pair. The
/// merge operation maintains this by folding duplicate submissions into the
/// existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    pub id: CountId,
    pub product_id: ProductId,
    pub batch: Batch,
    pub expiry: Expiry,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CountRecord {
    pub fn new(product_id: ProductId, batch: Batch, expiry: Expiry, quantity: i64) -> Self {
        let now = Utc::now();
        Self {
            id: CountId::new(RecordId::new()),
            product_id,
            batch,
            expiry,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// The "sum" branch of add-or-sum: add `quantity` to the stored value
    /// and refresh `updated_at`.
    ///
    /// The caller's expiry is deliberately not consulted here — on a top-up
    /// the original entry's expiry wins. Overflow on pathological repeated
    /// merges is rejected rather than wrapped.
    pub fn absorb(&mut self, quantity: i64) -> DomainResult<()> {
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invalid("quantidade", "quantidade total excede o limite"))?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estoque_products::ProductId;

    fn test_product_id() -> ProductId {
        ProductId::new(RecordId::new())
    }

    #[test]
    fn batch_is_trimmed_and_uppercased() {
        assert_eq!(Batch::parse("  a1 ").unwrap().as_str(), "A1");
    }

    #[test]
    fn batch_rejects_empty_after_normalization() {
        match Batch::parse("   ").unwrap_err() {
            DomainError::InvalidArgument { field, .. } => assert_eq!(field, "lote"),
            _ => panic!("expected InvalidArgument for empty batch"),
        }
    }

    #[test]
    fn expiry_validates_month_and_year_ranges() {
        assert!(Expiry::new(1, 2000).is_ok());
        assert!(Expiry::new(12, 2099).is_ok());
        assert!(Expiry::new(0, 2025).is_err());
        assert!(Expiry::new(13, 2025).is_err());
        assert!(Expiry::new(6, 1999).is_err());
        assert!(Expiry::new(6, 2100).is_err());
    }

    #[test]
    fn expiry_formats_as_mm_yyyy() {
        assert_eq!(Expiry::new(6, 2025).unwrap().to_string(), "06/2025");
        assert_eq!(Expiry::new(11, 2030).unwrap().to_string(), "11/2030");
    }

    #[test]
    fn quantity_rejects_negative() {
        assert!(validate_quantity(-1).is_err());
        assert_eq!(validate_quantity(0).unwrap(), 0);
        assert_eq!(validate_quantity(10).unwrap(), 10);
    }

    #[test]
    fn absorb_sums_quantities_and_keeps_expiry() {
        let expiry = Expiry::new(6, 2025).unwrap();
        let mut record = CountRecord::new(
            test_product_id(),
            Batch::parse("A1").unwrap(),
            expiry,
            10,
        );
        record.absorb(5).unwrap();
        assert_eq!(record.quantity, 15);
        assert_eq!(record.expiry, expiry);
    }

    #[test]
    fn absorb_refreshes_updated_at() {
        let mut record = CountRecord::new(
            test_product_id(),
            Batch::parse("A1").unwrap(),
            Expiry::new(6, 2025).unwrap(),
            1,
        );
        let before = record.updated_at;
        record.absorb(1).unwrap();
        assert!(record.updated_at >= before);
    }

    #[test]
    fn absorb_rejects_overflow() {
        let mut record = CountRecord::new(
            test_product_id(),
            Batch::parse("A1").unwrap(),
            Expiry::new(6, 2025).unwrap(),
            i64::MAX - 1,
        );
        assert!(record.absorb(10).is_err());
        // Quantity is left untouched on failure.
        assert_eq!(record.quantity, i64::MAX - 1);
    }
}
