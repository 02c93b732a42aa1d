//! Error types for the Notary.

use serde::{Deserialize, Serialize};
use star_notary_core::{CoreError, StarField, StarViolation};
use star_notary_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;

/// Errors that can occur during Notary operations.
#[derive(Debug, Error)]
pub enum NotaryError {
    /// Malformed input: bad hash, bad star.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Validation request lifecycle error.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No live validated authorization for the address.
    #[error("address {0} is not authorized to register a star")]
    Unauthorized(String),
}

/// Result type for Notary operations.
pub type Result<T> = std::result::Result<T, NotaryError>;

/// Transport-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Expired,
    InvalidInput,
    HeightConflict,
    VerificationFailed,
    Internal,
}

impl NotaryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(_) => ErrorKind::InvalidInput,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::HeightConflict { .. }) => ErrorKind::HeightConflict,
            Self::Store(_) => ErrorKind::Internal,
            Self::Registry(RegistryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Registry(RegistryError::Expired(_)) => ErrorKind::Expired,
            Self::Registry(RegistryError::VerificationFailed(_)) => ErrorKind::VerificationFailed,
            Self::Config(_) => ErrorKind::Internal,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }

    /// Star violations carried by an invalid-star rejection.
    pub fn violations(&self) -> &[StarViolation] {
        match self {
            Self::Core(CoreError::InvalidStar(violations)) => violations,
            _ => &[],
        }
    }

    /// The distinct fields named by [`violations`](Self::violations), in order.
    pub fn fields(&self) -> Vec<StarField> {
        let mut fields = Vec::new();
        for field in self.violations().iter().map(StarViolation::field) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            NotaryError::from(StoreError::NotFound("height 9".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            NotaryError::from(StoreError::HeightConflict { expected: 2, got: 1 }).kind(),
            ErrorKind::HeightConflict
        );
        assert_eq!(NotaryError::from(StoreError::Poisoned).kind(), ErrorKind::Internal);
        assert_eq!(
            NotaryError::from(RegistryError::Expired("a".into())).kind(),
            ErrorKind::Expired
        );
        assert_eq!(
            NotaryError::Unauthorized("a".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            NotaryError::from(CoreError::InvalidHashLength(3)).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_fields_from_violations() {
        let err = NotaryError::from(CoreError::InvalidStar(vec![
            StarViolation::Missing {
                field: StarField::Ra,
            },
            StarViolation::TooLong {
                field: StarField::Story,
                limit: 500,
                actual: 600,
            },
        ]));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.fields(), vec![StarField::Ra, StarField::Story]);
    }
}
