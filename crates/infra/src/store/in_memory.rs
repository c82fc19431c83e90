use std::sync::RwLock;

use chrono::Utc;

use estoque_core::{DomainError, DomainResult};
use estoque_counts::{Batch, CountId, CountRecord, Expiry};
use estoque_products::{Product, ProductCode, ProductId, ProductName};

use super::{CountSubmission, UpsertOutcome};

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    counts: Vec<CountRecord>,
}

/// In-memory store.
///
/// Intended for tests/dev and as the default backend when no database is
/// configured. The `RwLock` serializes merges, so the (product, batch)
/// uniqueness invariant cannot be raced in-process.
#[derive(Debug, Default)]
pub struct MemStore {
    state: RwLock<State>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| DomainError::internal("lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| DomainError::internal("lock poisoned"))
    }

    pub fn list_products(&self) -> DomainResult<Vec<Product>> {
        let state = self.read()?;
        let mut products = state.products.clone();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }

    pub fn create_product(&self, code: ProductCode, name: ProductName) -> DomainResult<Product> {
        let mut state = self.write()?;
        if state.products.iter().any(|p| p.code == code) {
            return Err(DomainError::conflict(format!(
                "produto com código {code} já existe"
            )));
        }
        let product = Product::new(code, name);
        state.products.push(product.clone());
        Ok(product)
    }

    pub fn find_product(&self, code: &ProductCode) -> DomainResult<Option<Product>> {
        let state = self.read()?;
        Ok(state.products.iter().find(|p| &p.code == code).cloned())
    }

    pub fn update_product(
        &self,
        id: ProductId,
        code: Option<ProductCode>,
        name: Option<ProductName>,
    ) -> DomainResult<Product> {
        let mut state = self.write()?;
        if let Some(new_code) = &code {
            if state
                .products
                .iter()
                .any(|p| &p.code == new_code && p.id != id)
            {
                return Err(DomainError::conflict(format!(
                    "produto com código {new_code} já existe"
                )));
            }
        }
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::not_found("produto"))?;
        if let Some(new_code) = code {
            product.code = new_code;
        }
        if let Some(new_name) = name {
            product.name = new_name;
        }
        Ok(product.clone())
    }

    /// Deletes the product and all of its count entries (cascade).
    pub fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        let mut state = self.write()?;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(DomainError::not_found("produto"));
        }
        state.counts.retain(|c| c.product_id != id);
        Ok(())
    }

    pub fn upsert_product_name(
        &self,
        code: ProductCode,
        name: ProductName,
    ) -> DomainResult<UpsertOutcome> {
        let mut state = self.write()?;
        if let Some(product) = state.products.iter_mut().find(|p| p.code == code) {
            if product.name == name {
                return Ok(UpsertOutcome::Unchanged);
            }
            product.name = name;
            return Ok(UpsertOutcome::Updated);
        }
        state.products.push(Product::new(code, name));
        Ok(UpsertOutcome::Created)
    }

    /// Add-or-sum merge.
    ///
    /// Returns the product, the resulting record, and whether a new entry
    /// was created. Expiry on the sum branch is ignored: the original
    /// entry's expiry wins.
    pub fn record_count(
        &self,
        code: &ProductCode,
        submission: CountSubmission,
    ) -> DomainResult<(Product, CountRecord, bool)> {
        let mut state = self.write()?;
        let product = state
            .products
            .iter()
            .find(|p| &p.code == code)
            .cloned()
            .ok_or_else(|| DomainError::not_found("produto"))?;

        if let Some(existing) = state
            .counts
            .iter_mut()
            .find(|c| c.product_id == product.id && c.batch == submission.batch)
        {
            existing.absorb(submission.quantity)?;
            return Ok((product, existing.clone(), false));
        }

        let record = CountRecord::new(
            product.id,
            submission.batch,
            submission.expiry,
            submission.quantity,
        );
        state.counts.push(record.clone());
        Ok((product, record, true))
    }

    pub fn list_counts(&self) -> DomainResult<Vec<(CountRecord, Product)>> {
        let state = self.read()?;
        let mut rows: Vec<(CountRecord, Product)> = state
            .counts
            .iter()
            .filter_map(|c| {
                state
                    .products
                    .iter()
                    .find(|p| p.id == c.product_id)
                    .map(|p| (c.clone(), p.clone()))
            })
            .collect();
        rows.sort_by(|a, b| (&a.1.code, &a.0.batch).cmp(&(&b.1.code, &b.0.batch)));
        Ok(rows)
    }

    pub fn counts_for_product(
        &self,
        code: &ProductCode,
    ) -> DomainResult<(Product, Vec<CountRecord>)> {
        let state = self.read()?;
        let product = state
            .products
            .iter()
            .find(|p| &p.code == code)
            .cloned()
            .ok_or_else(|| DomainError::not_found("produto"))?;
        let mut counts: Vec<CountRecord> = state
            .counts
            .iter()
            .filter(|c| c.product_id == product.id)
            .cloned()
            .collect();
        counts.sort_by(|a, b| a.batch.cmp(&b.batch));
        Ok((product, counts))
    }

    pub fn get_count(&self, id: CountId) -> DomainResult<(CountRecord, Product)> {
        let state = self.read()?;
        let count = state
            .counts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("contagem"))?;
        let product = state
            .products
            .iter()
            .find(|p| p.id == count.product_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("produto"))?;
        Ok((count, product))
    }

    /// Direct edit path. Unlike the merge, a batch collision here is an
    /// error, not a fold.
    pub fn update_count(
        &self,
        id: CountId,
        batch: Batch,
        expiry: Expiry,
        quantity: i64,
    ) -> DomainResult<CountRecord> {
        let mut state = self.write()?;
        let product_id = state
            .counts
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.product_id)
            .ok_or_else(|| DomainError::not_found("contagem"))?;
        if state
            .counts
            .iter()
            .any(|c| c.product_id == product_id && c.batch == batch && c.id != id)
        {
            return Err(DomainError::conflict(format!(
                "lote {batch} já existe para este produto"
            )));
        }
        let count = state
            .counts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::not_found("contagem"))?;
        count.batch = batch;
        count.expiry = expiry;
        count.quantity = quantity;
        count.updated_at = Utc::now();
        Ok(count.clone())
    }

    pub fn delete_count(&self, id: CountId) -> DomainResult<()> {
        let mut state = self.write()?;
        let before = state.counts.len();
        state.counts.retain(|c| c.id != id);
        if state.counts.len() == before {
            return Err(DomainError::not_found("contagem"));
        }
        Ok(())
    }

    /// Deletes every count entry. Returns how many were removed.
    pub fn clear_counts(&self) -> DomainResult<u64> {
        let mut state = self.write()?;
        let removed = state.counts.len() as u64;
        state.counts.clear();
        Ok(removed)
    }

    /// Raw data for the aggregation fold.
    pub fn snapshot(&self) -> DomainResult<(Vec<Product>, Vec<CountRecord>)> {
        let state = self.read()?;
        Ok((state.products.clone(), state.counts.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> ProductCode {
        ProductCode::parse(raw).unwrap()
    }

    fn name(raw: &str) -> ProductName {
        ProductName::parse(raw).unwrap()
    }

    fn submission(batch: &str, month: i64, year: i64, quantity: i64) -> CountSubmission {
        CountSubmission {
            batch: Batch::parse(batch).unwrap(),
            expiry: Expiry::new(month, year).unwrap(),
            quantity,
        }
    }

    #[test]
    fn create_product_rejects_duplicate_code() {
        let store = MemStore::new();
        store.create_product(code("7"), name("WIDGET")).unwrap();
        let err = store.create_product(code("0007"), name("OUTRO")).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn first_merge_creates_second_merge_sums() {
        let store = MemStore::new();
        store.create_product(code("7"), name("WIDGET")).unwrap();

        let (_, entry, created) = store
            .record_count(&code("7"), submission("A1", 6, 2025, 10))
            .unwrap();
        assert!(created);
        assert_eq!(entry.quantity, 10);

        // Same pair, different expiry: quantity sums, expiry is ignored.
        let (_, entry2, created2) = store
            .record_count(&code("7"), submission("a1 ", 1, 2030, 5))
            .unwrap();
        assert!(!created2);
        assert_eq!(entry2.id, entry.id);
        assert_eq!(entry2.quantity, 15);
        assert_eq!(entry2.expiry.to_string(), "06/2025");
    }

    #[test]
    fn merge_never_duplicates_a_pair() {
        let store = MemStore::new();
        store.create_product(code("1"), name("P")).unwrap();
        for _ in 0..10 {
            store
                .record_count(&code("1"), submission("LOTE-X", 6, 2025, 1))
                .unwrap();
        }
        let (_, counts) = store.counts_for_product(&code("1")).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].quantity, 10);
    }

    #[test]
    fn merge_unknown_product_is_not_found() {
        let store = MemStore::new();
        let err = store
            .record_count(&code("1"), submission("A", 6, 2025, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn delete_product_cascades_to_counts() {
        let store = MemStore::new();
        let product = store.create_product(code("1"), name("P")).unwrap();
        store
            .record_count(&code("1"), submission("A", 6, 2025, 3))
            .unwrap();
        store
            .record_count(&code("1"), submission("B", 6, 2025, 4))
            .unwrap();

        store.delete_product(product.id).unwrap();
        let (products, counts) = store.snapshot().unwrap();
        assert!(products.is_empty());
        assert!(counts.is_empty(), "no entry may outlive its product");
    }

    #[test]
    fn update_count_rejects_batch_collision() {
        let store = MemStore::new();
        store.create_product(code("1"), name("P")).unwrap();
        store
            .record_count(&code("1"), submission("A", 6, 2025, 1))
            .unwrap();
        let (_, entry, _) = store
            .record_count(&code("1"), submission("B", 6, 2025, 2))
            .unwrap();

        let err = store
            .update_count(
                entry.id,
                Batch::parse("A").unwrap(),
                Expiry::new(6, 2025).unwrap(),
                2,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_count_same_record_keeps_its_own_batch() {
        let store = MemStore::new();
        store.create_product(code("1"), name("P")).unwrap();
        let (_, entry, _) = store
            .record_count(&code("1"), submission("A", 6, 2025, 1))
            .unwrap();

        // Re-submitting the record's own batch is not a collision.
        let updated = store
            .update_count(
                entry.id,
                Batch::parse("A").unwrap(),
                Expiry::new(7, 2026).unwrap(),
                9,
            )
            .unwrap();
        assert_eq!(updated.quantity, 9);
        assert_eq!(updated.expiry.to_string(), "07/2026");
    }

    #[test]
    fn clear_counts_reports_removed_total() {
        let store = MemStore::new();
        store.create_product(code("1"), name("P")).unwrap();
        store
            .record_count(&code("1"), submission("A", 6, 2025, 1))
            .unwrap();
        store
            .record_count(&code("1"), submission("B", 6, 2025, 1))
            .unwrap();
        assert_eq!(store.clear_counts().unwrap(), 2);
        assert_eq!(store.clear_counts().unwrap(), 0);
    }

    #[test]
    fn list_counts_orders_by_code_then_batch_with_product() {
        let store = MemStore::new();
        store.create_product(code("20"), name("SEGUNDO")).unwrap();
        store.create_product(code("3"), name("PRIMEIRO")).unwrap();
        store
            .record_count(&code("20"), submission("A", 6, 2025, 1))
            .unwrap();
        store
            .record_count(&code("3"), submission("B2", 6, 2025, 2))
            .unwrap();
        store
            .record_count(&code("3"), submission("A1", 6, 2025, 3))
            .unwrap();

        let rows = store.list_counts().unwrap();
        let order: Vec<(String, String)> = rows
            .iter()
            .map(|(c, p)| (p.code.as_str().to_string(), c.batch.as_str().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("0003".to_string(), "A1".to_string()),
                ("0003".to_string(), "B2".to_string()),
                ("0020".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn get_count_returns_entry_with_its_product() {
        let store = MemStore::new();
        let product = store.create_product(code("1"), name("P")).unwrap();
        let (_, entry, _) = store
            .record_count(&code("1"), submission("A", 6, 2025, 4))
            .unwrap();

        let (found, owner) = store.get_count(entry.id).unwrap();
        assert_eq!(found.id, entry.id);
        assert_eq!(found.quantity, 4);
        assert_eq!(owner.id, product.id);
    }

    #[test]
    fn get_count_missing_id_is_not_found() {
        let store = MemStore::new();
        let err = store
            .get_count(CountId::new(estoque_core::RecordId::new()))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn delete_count_removes_only_that_entry() {
        let store = MemStore::new();
        store.create_product(code("1"), name("P")).unwrap();
        let (_, first, _) = store
            .record_count(&code("1"), submission("A", 6, 2025, 1))
            .unwrap();
        store
            .record_count(&code("1"), submission("B", 6, 2025, 2))
            .unwrap();

        store.delete_count(first.id).unwrap();
        let (_, counts) = store.counts_for_product(&code("1")).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].batch.as_str(), "B");

        let err = store.delete_count(first.id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn upsert_product_name_distinguishes_outcomes() {
        let store = MemStore::new();
        assert_eq!(
            store.upsert_product_name(code("1"), name("A")).unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(
            store.upsert_product_name(code("1"), name("A")).unwrap(),
            UpsertOutcome::Unchanged
        );
        assert_eq!(
            store.upsert_product_name(code("1"), name("B")).unwrap(),
            UpsertOutcome::Updated
        );
    }
}
