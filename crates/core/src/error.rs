//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// uniqueness conflicts, missing records). Storage failures are carried as
/// `Internal` so handlers can roll up to a single failure response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced record does not exist.
    #[error("{0} não encontrado")]
    NotFound(String),

    /// A field failed validation. `field` names the offending input.
    #[error("{field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    /// A uniqueness conflict (duplicate code, duplicate batch on the direct
    /// edit path — the merge path folds duplicates instead).
    #[error("conflito: {0}")]
    Conflict(String),

    /// Storage-layer failure.
    #[error("falha interna: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
