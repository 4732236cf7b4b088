//! Core Error Types
//!
//! Defines the foundational error types used across the QA Auditor workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The deterministic tools only fail on invalid configuration (unknown profile,
//! unknown requirement set, malformed tables) or on out-of-range input. The
//! application crate wraps these into its run-level error type.

use thiserror::Error;

/// Core error type for the QA Auditor workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors (malformed tables, weights not summing to 1.0, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors (malformed transcript records)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown weight profile name
    #[error("Invalid weight profile: {0}")]
    InvalidProfile(String),

    /// Unknown requirement set name
    #[error("Unknown requirement set: {0}")]
    UnknownRequirementSet(String),

    /// A sub-score outside [0, 100]
    #[error("Score out of range: {dimension} = {value}")]
    OutOfRange { dimension: String, value: f64 },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid profile error
    pub fn invalid_profile(name: impl Into<String>) -> Self {
        Self::InvalidProfile(name.into())
    }

    /// Create an unknown requirement set error
    pub fn unknown_requirement_set(name: impl Into<String>) -> Self {
        Self::UnknownRequirementSet(name.into())
    }

    /// Create an out-of-range error
    pub fn out_of_range(dimension: impl Into<String>, value: f64) -> Self {
        Self::OutOfRange {
            dimension: dimension.into(),
            value,
        }
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error indicates a deployment/configuration defect.
    ///
    /// These are the only errors that abort a whole audit run.
    pub fn is_config_defect(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_)
                | CoreError::InvalidProfile(_)
                | CoreError::UnknownRequirementSet(_)
        )
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
