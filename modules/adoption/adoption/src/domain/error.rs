//! Domain error types for the adoption module.

use adoption_sdk::{AdoptionError, ConflictKind};
use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors for the adoption module.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A referenced actor or entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// The actor lacks permission or does not own the target.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An input precondition was violated.
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    /// A duplicate-prevention invariant was violated.
    #[error("Conflict ({kind}): {message}")]
    Conflict { kind: ConflictKind, message: String },

    /// A storage read or write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            message: message.into(),
        }
    }
}

impl From<DomainError> for AdoptionError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { entity, id } => Self::not_found(entity, id),
            DomainError::Forbidden(msg) => Self::forbidden(msg),
            DomainError::Validation { field, message } => {
                Self::validation(format!("{field}: {message}"))
            }
            DomainError::Conflict { kind, message } => Self::conflict(kind, message),
            DomainError::Storage(e) => Self::internal(e.to_string()),
        }
    }
}
