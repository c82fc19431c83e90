//! `estoque-infra` — storage backends.
//!
//! Two stores with the same method surface: [`store::MemStore`] (tests/dev)
//! and [`store::PgStore`] (sqlx/Postgres). Handlers receive a store handle
//! explicitly; there is no ambient global session.

pub mod store;

pub use store::{CountSubmission, MemStore, PgStore, UpsertOutcome};
