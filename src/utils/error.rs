//! Error Handling
//!
//! Run-level error type for the auditor. Only failures that abort a run are
//! errors; per-interaction problems are recorded as `RunIssue`s in the flow
//! state instead.

use thiserror::Error;

use qa_auditor_core::CoreError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (invalid run settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown requirement set or weight profile, or invalid rule tables
    #[error("Tool configuration error: {0}")]
    ToolConfig(String),

    /// A malformed transcript when the run is configured to fail fast
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Errors raised by the deterministic tools
    #[error(transparent)]
    Core(CoreError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collaborator backend could not be constructed
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] qa_auditor_llm::LlmError),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a tool configuration error
    pub fn tool_config(msg: impl Into<String>) -> Self {
        Self::ToolConfig(msg.into())
    }

    /// Create a malformed input error
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Table and profile problems surface as `ToolConfig`; everything else
/// keeps its core classification.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        if err.is_config_defect() {
            AppError::ToolConfig(err.to_string())
        } else {
            AppError::Core(err)
        }
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
