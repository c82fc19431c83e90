//! Postgres-backed store (sqlx).
//!
//! Schema is bootstrapped on startup. The add-or-sum merge is a single
//! atomic upsert scoped to the `(produto_id, lote)` unique key, so two
//! concurrent submissions for the same pair cannot both insert — one inserts
//! and the other lands on the `DO UPDATE` branch. Product deletion cascades
//! to count entries via the foreign key.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use estoque_core::{DomainError, DomainResult, RecordId};
use estoque_counts::{Batch, CountId, CountRecord, Expiry};
use estoque_products::{Product, ProductCode, ProductId, ProductName};

use super::{CountSubmission, UpsertOutcome};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS produtos (
    id UUID PRIMARY KEY,
    codigo TEXT NOT NULL UNIQUE,
    nome TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS contagens (
    id UUID PRIMARY KEY,
    produto_id UUID NOT NULL REFERENCES produtos(id) ON DELETE CASCADE,
    lote TEXT NOT NULL,
    validade_mes SMALLINT NOT NULL,
    validade_ano SMALLINT NOT NULL,
    quantidade BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (produto_id, lote)
);
"#;

/// Postgres store.
pub struct PgStore {
    pool: PgPool,
}

fn internal(e: impl core::fmt::Display) -> DomainError {
    DomainError::internal(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn product_from_row(row: &PgRow) -> DomainResult<Product> {
    let id: Uuid = row.try_get("id").map_err(internal)?;
    let codigo: String = row.try_get("codigo").map_err(internal)?;
    let nome: String = row.try_get("nome").map_err(internal)?;
    Ok(Product {
        id: ProductId::new(RecordId::from_uuid(id)),
        code: ProductCode::parse(&codigo).map_err(|e| internal(format!("codigo armazenado inválido: {e}")))?,
        name: ProductName::parse(&nome).map_err(|e| internal(format!("nome armazenado inválido: {e}")))?,
        created_at: row.try_get("created_at").map_err(internal)?,
    })
}

fn count_from_row(row: &PgRow) -> DomainResult<CountRecord> {
    let id: Uuid = row.try_get("id").map_err(internal)?;
    let produto_id: Uuid = row.try_get("produto_id").map_err(internal)?;
    let lote: String = row.try_get("lote").map_err(internal)?;
    let mes: i16 = row.try_get("validade_mes").map_err(internal)?;
    let ano: i16 = row.try_get("validade_ano").map_err(internal)?;
    Ok(CountRecord {
        id: CountId::new(RecordId::from_uuid(id)),
        product_id: ProductId::new(RecordId::from_uuid(produto_id)),
        batch: Batch::parse(&lote).map_err(|e| internal(format!("lote armazenado inválido: {e}")))?,
        expiry: Expiry {
            month: mes as u8,
            year: ano as u16,
        },
        quantity: row.try_get("quantidade").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bootstrap the schema.
    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .map_err(internal)?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        tracing::info!("database schema ensured");
        Ok(())
    }

    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, codigo, nome, created_at FROM produtos ORDER BY codigo",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(product_from_row).collect()
    }

    pub async fn create_product(
        &self,
        code: ProductCode,
        name: ProductName,
    ) -> DomainResult<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO produtos (id, codigo, nome)
            VALUES ($1, $2, $3)
            RETURNING id, codigo, nome, created_at
            "#,
        )
        .bind(Uuid::from(RecordId::new()))
        .bind(code.as_str())
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("produto com código {code} já existe"))
            } else {
                internal(e)
            }
        })?;
        product_from_row(&row)
    }

    pub async fn find_product(&self, code: &ProductCode) -> DomainResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, codigo, nome, created_at FROM produtos WHERE codigo = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(product_from_row).transpose()
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        code: Option<ProductCode>,
        name: Option<ProductName>,
    ) -> DomainResult<Product> {
        let row = sqlx::query(
            r#"
            UPDATE produtos
            SET codigo = COALESCE($2, codigo),
                nome = COALESCE($3, nome)
            WHERE id = $1
            RETURNING id, codigo, nome, created_at
            "#,
        )
        .bind(Uuid::from(id.0))
        .bind(code.as_ref().map(|c| c.as_str().to_string()))
        .bind(name.as_ref().map(|n| n.as_str().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("produto com este código já existe".to_string())
            } else {
                internal(e)
            }
        })?;
        match row {
            Some(row) => product_from_row(&row),
            None => Err(DomainError::not_found("produto")),
        }
    }

    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        // Count entries go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM produtos WHERE id = $1")
            .bind(Uuid::from(id.0))
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("produto"));
        }
        Ok(())
    }

    pub async fn upsert_product_name(
        &self,
        code: ProductCode,
        name: ProductName,
    ) -> DomainResult<UpsertOutcome> {
        if let Some(existing) = self.find_product(&code).await? {
            if existing.name == name {
                return Ok(UpsertOutcome::Unchanged);
            }
            sqlx::query("UPDATE produtos SET nome = $2 WHERE id = $1")
                .bind(Uuid::from(existing.id.0))
                .bind(name.as_str())
                .execute(&self.pool)
                .await
                .map_err(internal)?;
            return Ok(UpsertOutcome::Updated);
        }
        self.create_product(code, name).await?;
        Ok(UpsertOutcome::Created)
    }

    /// Add-or-sum merge as a single atomic upsert.
    ///
    /// On conflict the stored quantity is incremented and `updated_at`
    /// refreshed; the submitted expiry is dropped (the original entry's
    /// expiry wins). `xmax = 0` distinguishes a fresh insert from the
    /// update branch.
    pub async fn record_count(
        &self,
        code: &ProductCode,
        submission: CountSubmission,
    ) -> DomainResult<(Product, CountRecord, bool)> {
        let product = self
            .find_product(code)
            .await?
            .ok_or_else(|| DomainError::not_found("produto"))?;

        let row = sqlx::query(
            r#"
            INSERT INTO contagens (id, produto_id, lote, validade_mes, validade_ano, quantidade)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (produto_id, lote)
            DO UPDATE SET
                quantidade = contagens.quantidade + EXCLUDED.quantidade,
                updated_at = now()
            RETURNING id, produto_id, lote, validade_mes, validade_ano, quantidade,
                      created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::from(RecordId::new()))
        .bind(Uuid::from(product.id.0))
        .bind(submission.batch.as_str())
        .bind(submission.expiry.month as i16)
        .bind(submission.expiry.year as i16)
        .bind(submission.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        let created: bool = row.try_get("inserted").map_err(internal)?;
        let record = count_from_row(&row)?;
        Ok((product, record, created))
    }

    pub async fn list_counts(&self) -> DomainResult<Vec<(CountRecord, Product)>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.produto_id, c.lote, c.validade_mes, c.validade_ano,
                   c.quantidade, c.created_at, c.updated_at,
                   p.id AS p_id, p.codigo, p.nome, p.created_at AS p_created_at
            FROM contagens c
            JOIN produtos p ON p.id = c.produto_id
            ORDER BY p.codigo, c.lote
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter()
            .map(|row| {
                let count = count_from_row(row)?;
                let product = joined_product_from_row(row)?;
                Ok((count, product))
            })
            .collect()
    }

    pub async fn counts_for_product(
        &self,
        code: &ProductCode,
    ) -> DomainResult<(Product, Vec<CountRecord>)> {
        let product = self
            .find_product(code)
            .await?
            .ok_or_else(|| DomainError::not_found("produto"))?;
        let rows = sqlx::query(
            r#"
            SELECT id, produto_id, lote, validade_mes, validade_ano, quantidade,
                   created_at, updated_at
            FROM contagens
            WHERE produto_id = $1
            ORDER BY lote
            "#,
        )
        .bind(Uuid::from(product.id.0))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        let counts = rows.iter().map(count_from_row).collect::<DomainResult<_>>()?;
        Ok((product, counts))
    }

    pub async fn get_count(&self, id: CountId) -> DomainResult<(CountRecord, Product)> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.produto_id, c.lote, c.validade_mes, c.validade_ano,
                   c.quantidade, c.created_at, c.updated_at,
                   p.id AS p_id, p.codigo, p.nome, p.created_at AS p_created_at
            FROM contagens c
            JOIN produtos p ON p.id = c.produto_id
            WHERE c.id = $1
            "#,
        )
        .bind(Uuid::from(id.0))
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| DomainError::not_found("contagem"))?;
        Ok((count_from_row(&row)?, joined_product_from_row(&row)?))
    }

    pub async fn update_count(
        &self,
        id: CountId,
        batch: Batch,
        expiry: Expiry,
        quantity: i64,
    ) -> DomainResult<CountRecord> {
        let row = sqlx::query(
            r#"
            UPDATE contagens
            SET lote = $2, validade_mes = $3, validade_ano = $4,
                quantidade = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, produto_id, lote, validade_mes, validade_ano, quantidade,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::from(id.0))
        .bind(batch.as_str())
        .bind(expiry.month as i16)
        .bind(expiry.year as i16)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("lote {batch} já existe para este produto"))
            } else {
                internal(e)
            }
        })?;
        match row {
            Some(row) => count_from_row(&row),
            None => Err(DomainError::not_found("contagem")),
        }
    }

    pub async fn delete_count(&self, id: CountId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM contagens WHERE id = $1")
            .bind(Uuid::from(id.0))
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("contagem"));
        }
        Ok(())
    }

    pub async fn clear_counts(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM contagens")
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected())
    }

    pub async fn snapshot(&self) -> DomainResult<(Vec<Product>, Vec<CountRecord>)> {
        let products = self.list_products().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, produto_id, lote, validade_mes, validade_ano, quantidade,
                   created_at, updated_at
            FROM contagens
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        let counts = rows.iter().map(count_from_row).collect::<DomainResult<_>>()?;
        Ok((products, counts))
    }
}

/// Product columns from a joined contagens/produtos row (aliased `p_*`).
fn joined_product_from_row(row: &PgRow) -> DomainResult<Product> {
    let id: Uuid = row.try_get("p_id").map_err(internal)?;
    let codigo: String = row.try_get("codigo").map_err(internal)?;
    let nome: String = row.try_get("nome").map_err(internal)?;
    Ok(Product {
        id: ProductId::new(RecordId::from_uuid(id)),
        code: ProductCode::parse(&codigo).map_err(|e| internal(format!("codigo armazenado inválido: {e}")))?,
        name: ProductName::parse(&nome).map_err(|e| internal(format!("nome armazenado inválido: {e}")))?,
        created_at: row.try_get("p_created_at").map_err(internal)?,
    })
}
