//! Unified error types for objdb
//!
//! Every failure mode in the crate maps to one `StoreError` kind with a
//! stable machine-readable code. Single-record operations raise these
//! directly; batch operations classify per-record failures in the returned
//! `MutationEvent` and only raise for structurally invalid calls.

use thiserror::Error;

/// Crate-wide result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error type for store, index and mutation operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Structurally invalid call (bad record shape, malformed path, bad operand)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unique index already holds a record for this value
    #[error("duplicate value on unique index ({property})")]
    DuplicateKey { property: String },

    /// Required index property is absent from the record
    #[error("required property {property} is missing")]
    RequiredMissing { property: String },

    /// Re-indexing a mutated record failed; the record was rolled back
    #[error("update caused an indexing failure; record restored")]
    UpdateIndexViolation,

    /// Upsert target has no identity and no usable primary key
    #[error("record has no identity and no usable primary key")]
    MissingKey,

    /// Unrecognized query or changeset operator
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// An index is already configured for this property
    #[error("index already exists on {property}")]
    IndexAlreadyExists { property: String },

    /// No index configured for this property
    #[error("no index on {property}")]
    IndexNotFound { property: String },

    /// A value had the wrong shape for the requested operation
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

impl StoreError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a duplicate key error for an index property
    pub fn duplicate_key(property: impl Into<String>) -> Self {
        Self::DuplicateKey {
            property: property.into(),
        }
    }

    /// Create a required-property error for an index property
    pub fn required_missing(property: impl Into<String>) -> Self {
        Self::RequiredMissing {
            property: property.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::RequiredMissing { .. } => "REQUIRED_MISSING",
            Self::UpdateIndexViolation => "UPDATE_INDEX_VIOLATION",
            Self::MissingKey => "MISSING_KEY",
            Self::InvalidOperator(_) => "INVALID_OPERATOR",
            Self::IndexAlreadyExists { .. } => "INDEX_ALREADY_EXISTS",
            Self::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Self::TypeMismatch(_) => "TYPE_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            StoreError::duplicate_key("email").code(),
            "DUPLICATE_KEY"
        );
        assert_eq!(StoreError::MissingKey.code(), "MISSING_KEY");
        assert_eq!(
            StoreError::UpdateIndexViolation.code(),
            "UPDATE_INDEX_VIOLATION"
        );
    }

    #[test]
    fn test_display_names_property() {
        let err = StoreError::required_missing("user.name");
        assert!(err.to_string().contains("user.name"));
    }
}
