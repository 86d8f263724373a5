//! Error types for cinecache operations

use crate::EntityType;
use thiserror::Error;

/// Failures reported by the durable store collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: i64 },

    #[error("Access forbidden for {operation}: {reason}")]
    Forbidden { operation: String, reason: String },

    #[error("Store failure during {operation}: {reason}")]
    Failure { operation: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Input rejected before any cache or store access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value {value} for {field} is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Master error type for all cinecache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CineError {
    /// Shorthand for a store-level not-found error.
    pub fn not_found(entity_type: EntityType, id: i64) -> Self {
        CineError::Store(StoreError::NotFound { entity_type, id })
    }

    /// Whether this error reports an absent entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CineError::Store(StoreError::NotFound { .. }))
    }
}

/// Result type alias for cinecache operations.
pub type CineResult<T> = Result<T, CineError>;

// =============================================================================
// TESTS
// =============================================================================
