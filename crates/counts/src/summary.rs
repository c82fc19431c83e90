//! Read-only aggregation of the count ledger.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use estoque_products::{Product, ProductId};

use crate::entry::CountRecord;

/// One product with its entries and per-product total.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub product: Product,
    pub entries: Vec<CountRecord>,
    pub total_quantity: i64,
}

/// Rollup of the whole ledger.
#[derive(Debug, Clone, Serialize)]
pub struct StockSummary {
    pub items: Vec<ProductSummary>,
    pub total_quantity: i64,
    pub product_count: usize,
    pub include_zero_stock: bool,
    pub generated_at: DateTime<Utc>,
}

/// Pure fold over (products, counts): no mutation, no side effects.
///
/// Products are ordered by code ascending, entries by batch ascending. When
/// `include_zero_stock` is false, products totalling exactly 0 are dropped
/// from both the result and the product count; zero-quantity entries inside
/// a non-zero product are kept. The grand total is unaffected by the filter.
pub fn summarize(
    mut products: Vec<Product>,
    counts: Vec<CountRecord>,
    include_zero_stock: bool,
) -> StockSummary {
    products.sort_by(|a, b| a.code.cmp(&b.code));

    let mut by_product: HashMap<ProductId, Vec<CountRecord>> = HashMap::new();
    for count in counts {
        by_product.entry(count.product_id).or_default().push(count);
    }

    let mut items = Vec::with_capacity(products.len());
    let mut total_quantity: i64 = 0;

    for product in products {
        let mut entries = by_product.remove(&product.id).unwrap_or_default();
        entries.sort_by(|a, b| a.batch.cmp(&b.batch));
        let product_total: i64 = entries.iter().map(|e| e.quantity).sum();

        if !include_zero_stock && product_total == 0 {
            continue;
        }

        total_quantity += product_total;
        items.push(ProductSummary {
            product,
            entries,
            total_quantity: product_total,
        });
    }

    let product_count = items.len();
    StockSummary {
        items,
        total_quantity,
        product_count,
        include_zero_stock,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Batch, Expiry};
    use estoque_products::{ProductCode, ProductName};

    fn product(code: &str, name: &str) -> Product {
        Product::new(
            ProductCode::parse(code).unwrap(),
            ProductName::parse(name).unwrap(),
        )
    }

    fn count(product: &Product, batch: &str, quantity: i64) -> CountRecord {
        CountRecord::new(
            product.id,
            Batch::parse(batch).unwrap(),
            Expiry::new(6, 2025).unwrap(),
            quantity,
        )
    }

    #[test]
    fn orders_products_by_code_and_entries_by_batch() {
        let p2 = product("20", "SEGUNDO");
        let p1 = product("3", "PRIMEIRO");
        let counts = vec![count(&p1, "B2", 1), count(&p1, "A1", 2), count(&p2, "C1", 3)];

        let summary = summarize(vec![p2.clone(), p1.clone()], counts, true);
        assert_eq!(summary.items[0].product.code.as_str(), "0003");
        assert_eq!(summary.items[1].product.code.as_str(), "0020");
        assert_eq!(summary.items[0].entries[0].batch.as_str(), "A1");
        assert_eq!(summary.items[0].entries[1].batch.as_str(), "B2");
    }

    #[test]
    fn grand_total_is_sum_of_all_entries() {
        let p1 = product("1", "UM");
        let p2 = product("2", "DOIS");
        let counts = vec![count(&p1, "A", 10), count(&p1, "B", 5), count(&p2, "A", 7)];

        let summary = summarize(vec![p1, p2], counts, true);
        assert_eq!(summary.total_quantity, 22);
        assert_eq!(summary.items[0].total_quantity, 15);
        assert_eq!(summary.items[1].total_quantity, 7);
        assert_eq!(summary.product_count, 2);
    }

    #[test]
    fn products_without_entries_total_zero() {
        let p = product("1", "VAZIO");
        let summary = summarize(vec![p], vec![], true);
        assert_eq!(summary.items[0].total_quantity, 0);
        assert!(summary.items[0].entries.is_empty());
    }

    #[test]
    fn excluding_zero_stock_drops_only_zero_total_products() {
        let zeroed = product("1", "ZERADO");
        let stocked = product("2", "COM ESTOQUE");
        // A zero-quantity entry inside a non-zero product must survive.
        let counts = vec![
            count(&zeroed, "A", 0),
            count(&stocked, "A", 0),
            count(&stocked, "B", 9),
        ];

        let summary = summarize(vec![zeroed.clone(), stocked.clone()], counts, false);
        assert_eq!(summary.product_count, 1);
        assert_eq!(summary.items[0].product.id, stocked.id);
        assert_eq!(summary.items[0].entries.len(), 2);
        assert_eq!(summary.total_quantity, 9);
    }

    #[test]
    fn zero_stock_filter_does_not_change_grand_total() {
        let zeroed = product("1", "ZERADO");
        let stocked = product("2", "COM ESTOQUE");
        let counts = vec![count(&zeroed, "A", 0), count(&stocked, "A", 4)];

        let all = summarize(
            vec![zeroed.clone(), stocked.clone()],
            counts.clone(),
            true,
        );
        let filtered = summarize(vec![zeroed, stocked], counts, false);
        assert_eq!(all.total_quantity, filtered.total_quantity);
        assert_eq!(all.product_count, 2);
        assert_eq!(filtered.product_count, 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The grand total always equals the sum of every entry quantity,
            /// whether or not zero-stock products are filtered out.
            #[test]
            fn total_equals_sum_of_quantities(
                quantities in proptest::collection::vec(0i64..10_000, 0..20)
            ) {
                let p = product("1", "PRODUTO");
                let counts: Vec<CountRecord> = quantities
                    .iter()
                    .enumerate()
                    .map(|(i, q)| count(&p, &format!("L{i}"), *q))
                    .collect();
                let expected: i64 = quantities.iter().sum();

                let all = summarize(vec![p.clone()], counts.clone(), true);
                prop_assert_eq!(all.total_quantity, expected);

                let filtered = summarize(vec![p], counts, false);
                prop_assert_eq!(filtered.total_quantity, expected);
            }
        }
    }
}
