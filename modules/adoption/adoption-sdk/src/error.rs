//! Public error types for the adoption module.
//!
//! These errors are safe to expose to other modules and consumers. The calling
//! layer translates them into transport-level responses.

use std::fmt;

use thiserror::Error;

/// Which uniqueness invariant a [`AdoptionError::Conflict`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// A `consultation_pending` application already exists for the adopter/breeder pair.
    PendingApplication,
    /// The adopter already reviewed this breeder.
    Review,
    /// The breeder is already in the adopter's favorites.
    Favorite,
}

impl ConflictKind {
    /// Stable machine-readable code for calling UIs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PendingApplication => "APPLICATION_ALREADY_PENDING",
            Self::Review => "REVIEW_ALREADY_EXISTS",
            Self::Favorite => "FAVORITE_ALREADY_EXISTS",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can be returned by the `AdoptionApi`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdoptionError {
    /// The referenced actor or entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor lacks permission or does not own the target.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An input precondition was violated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A duplicate-prevention invariant was violated.
    #[error("Already exists ({kind}): {message}")]
    Conflict { kind: ConflictKind, message: String },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdoptionError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns the conflict kind if this is a `Conflict` error.
    #[must_use]
    pub const fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
