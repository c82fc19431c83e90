use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estoque_core::{DomainError, DomainResult, RecordId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Four-digit, zero-padded product code.
///
/// Derived by formatting an integer in `[0, 9999]`; the canonical form is
/// always exactly four ASCII digits, so `"12"`, `"0012"` and `12` all
/// resolve to the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    /// Parse and canonicalize a raw code.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        let n: u32 = trimmed
            .parse()
            .map_err(|_| DomainError::invalid("codigo", "código deve ser numérico"))?;
        if n > 9999 {
            return Err(DomainError::invalid(
                "codigo",
                "código deve estar entre 0000 e 9999",
            ));
        }
        Ok(Self(format!("{n:04}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product display name, normalized (trimmed, uppercased) on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::invalid("nome", "nome não pode estar vazio"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inventoried product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: ProductCode,
    pub name: ProductName,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(code: ProductCode, name: ProductName) -> Self {
        Self {
            id: ProductId::new(RecordId::new()),
            code,
            name,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded_to_four_digits() {
        assert_eq!(ProductCode::parse("7").unwrap().as_str(), "0007");
        assert_eq!(ProductCode::parse("12").unwrap().as_str(), "0012");
        assert_eq!(ProductCode::parse("0012").unwrap().as_str(), "0012");
        assert_eq!(ProductCode::parse("9999").unwrap().as_str(), "9999");
        assert_eq!(ProductCode::parse("0").unwrap().as_str(), "0000");
    }

    #[test]
    fn code_rejects_out_of_range() {
        let err = ProductCode::parse("10000").unwrap_err();
        match err {
            DomainError::InvalidArgument { field, .. } => assert_eq!(field, "codigo"),
            _ => panic!("expected InvalidArgument for out-of-range code"),
        }
        assert!(ProductCode::parse("-1").is_err());
        assert!(ProductCode::parse("99999").is_err());
    }

    #[test]
    fn code_rejects_non_numeric() {
        assert!(ProductCode::parse("abcd").is_err());
        assert!(ProductCode::parse("12a").is_err());
        assert!(ProductCode::parse("").is_err());
    }

    #[test]
    fn equivalent_codes_canonicalize_to_same_value() {
        let a = ProductCode::parse("12").unwrap();
        let b = ProductCode::parse("0012").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn name_is_trimmed_and_uppercased() {
        let name = ProductName::parse("  Bolt m3 ").unwrap();
        assert_eq!(name.as_str(), "BOLT M3");
    }

    #[test]
    fn name_rejects_empty_after_normalization() {
        match ProductName::parse("   ").unwrap_err() {
            DomainError::InvalidArgument { field, .. } => assert_eq!(field, "nome"),
            _ => panic!("expected InvalidArgument for empty name"),
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every integer in [0, 9999] formats to exactly four digits and
            /// round-trips through parse.
            #[test]
            fn valid_codes_format_to_four_digits(n in 0u32..=9999) {
                let code = ProductCode::parse(&n.to_string()).unwrap();
                prop_assert_eq!(code.as_str().len(), 4);
                prop_assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
                prop_assert_eq!(ProductCode::parse(code.as_str()).unwrap(), code);
            }

            /// Codes above 9999 are always rejected.
            #[test]
            fn out_of_range_codes_are_rejected(n in 10000u64..1_000_000) {
                prop_assert!(ProductCode::parse(&n.to_string()).is_err());
            }
        }
    }
}
