//! Storage backend selection and dispatch.
//!
//! `DATABASE_URL` set → Postgres; otherwise the in-memory store (dev and
//! tests). Both stores expose the same method surface, so handlers call
//! through this enum and never know which backend they hit.

use estoque_core::DomainResult;
use estoque_counts::{Batch, CountId, CountRecord, Expiry};
use estoque_infra::{CountSubmission, MemStore, PgStore, UpsertOutcome};
use estoque_products::{Product, ProductCode, ProductId, ProductName};

pub enum AppServices {
    InMemory(MemStore),
    Postgres(PgStore),
}

impl AppServices {
    /// Pick the backend from the environment.
    pub async fn from_env() -> DomainResult<Self> {
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                tracing::info!("using postgres store");
                Ok(Self::Postgres(PgStore::connect(&url).await?))
            }
            Err(_) => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Ok(Self::InMemory(MemStore::new()))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory(MemStore::new())
    }

    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        match self {
            Self::InMemory(s) => s.list_products(),
            Self::Postgres(s) => s.list_products().await,
        }
    }

    pub async fn create_product(
        &self,
        code: ProductCode,
        name: ProductName,
    ) -> DomainResult<Product> {
        match self {
            Self::InMemory(s) => s.create_product(code, name),
            Self::Postgres(s) => s.create_product(code, name).await,
        }
    }

    pub async fn find_product(&self, code: &ProductCode) -> DomainResult<Option<Product>> {
        match self {
            Self::InMemory(s) => s.find_product(code),
            Self::Postgres(s) => s.find_product(code).await,
        }
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        code: Option<ProductCode>,
        name: Option<ProductName>,
    ) -> DomainResult<Product> {
        match self {
            Self::InMemory(s) => s.update_product(id, code, name),
            Self::Postgres(s) => s.update_product(id, code, name).await,
        }
    }

    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        match self {
            Self::InMemory(s) => s.delete_product(id),
            Self::Postgres(s) => s.delete_product(id).await,
        }
    }

    pub async fn upsert_product_name(
        &self,
        code: ProductCode,
        name: ProductName,
    ) -> DomainResult<UpsertOutcome> {
        match self {
            Self::InMemory(s) => s.upsert_product_name(code, name),
            Self::Postgres(s) => s.upsert_product_name(code, name).await,
        }
    }

    pub async fn record_count(
        &self,
        code: &ProductCode,
        submission: CountSubmission,
    ) -> DomainResult<(Product, CountRecord, bool)> {
        match self {
            Self::InMemory(s) => s.record_count(code, submission),
            Self::Postgres(s) => s.record_count(code, submission).await,
        }
    }

    pub async fn list_counts(&self) -> DomainResult<Vec<(CountRecord, Product)>> {
        match self {
            Self::InMemory(s) => s.list_counts(),
            Self::Postgres(s) => s.list_counts().await,
        }
    }

    pub async fn counts_for_product(
        &self,
        code: &ProductCode,
    ) -> DomainResult<(Product, Vec<CountRecord>)> {
        match self {
            Self::InMemory(s) => s.counts_for_product(code),
            Self::Postgres(s) => s.counts_for_product(code).await,
        }
    }

    pub async fn get_count(&self, id: CountId) -> DomainResult<(CountRecord, Product)> {
        match self {
            Self::InMemory(s) => s.get_count(id),
            Self::Postgres(s) => s.get_count(id).await,
        }
    }

    pub async fn update_count(
        &self,
        id: CountId,
        batch: Batch,
        expiry: Expiry,
        quantity: i64,
    ) -> DomainResult<CountRecord> {
        match self {
            Self::InMemory(s) => s.update_count(id, batch, expiry, quantity),
            Self::Postgres(s) => s.update_count(id, batch, expiry, quantity).await,
        }
    }

    pub async fn delete_count(&self, id: CountId) -> DomainResult<()> {
        match self {
            Self::InMemory(s) => s.delete_count(id),
            Self::Postgres(s) => s.delete_count(id).await,
        }
    }

    pub async fn clear_counts(&self) -> DomainResult<u64> {
        match self {
            Self::InMemory(s) => s.clear_counts(),
            Self::Postgres(s) => s.clear_counts().await,
        }
    }

    pub async fn snapshot(&self) -> DomainResult<(Vec<Product>, Vec<CountRecord>)> {
        match self {
            Self::InMemory(s) => s.snapshot(),
            Self::Postgres(s) => s.snapshot().await,
        }
    }
}
