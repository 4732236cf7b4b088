//! Collaborator Types
//!
//! Error type, provider configuration and the request/response contracts of
//! the two narrative collaborators. Responses are validated before they are
//! handed back to the caller: a record that parses but breaks the contract is
//! a `SchemaViolation`, never a silently clamped value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qa_auditor_core::{CoachingExample, ComplianceFinding, Dimension, SubScores};

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by narrative providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("server error: {message}")]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    #[error("network error: {message}")]
    NetworkError { message: String },

    /// The response could not be parsed at all
    #[error("parse error: {message}")]
    ParseError { message: String },

    /// The response parsed but violates the output contract
    #[error("schema violation: {message}")]
    SchemaViolation { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl LlmError {
    /// Whether this error is transient and the call should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::NetworkError { .. }
                | LlmError::RateLimited { .. }
                | LlmError::ServerError { .. }
        )
    }

    /// Whether the collaborator answered but the answer was unusable.
    pub fn is_invalid_output(&self) -> bool {
        matches!(
            self,
            LlmError::ParseError { .. } | LlmError::SchemaViolation { .. }
        )
    }

    /// For rate-limited errors, the suggested wait time in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if let LlmError::RateLimited { retry_after, .. } = self {
            retry_after.map(|s| s as u64)
        } else {
            None
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        LlmError::SchemaViolation {
            message: message.into(),
        }
    }
}

/// Result alias for provider calls.
pub type LlmResult<T> = Result<T, LlmError>;

// ============================================================================
// Provider Configuration
// ============================================================================

/// Which backend answers collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Deterministic rule-based backend, no network
    #[default]
    Heuristic,
    /// Any OpenAI-compatible chat completions endpoint
    #[serde(alias = "openai")]
    OpenAi,
}

/// Backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for the chat completions endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    /// Resolved API key (never serialized)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            base_url: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    /// Fill `api_key` from the configured environment variable if unset.
    pub fn resolve_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(&self.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }
}

// ============================================================================
// Narrative Analysis
// ============================================================================

/// Input to the narrative analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub interaction_id: String,
    pub agent_id: String,
    pub channel: String,
    pub transcript_text: String,
    #[serde(default)]
    pub customer_issue: String,
    #[serde(default)]
    pub resolution_status: String,
    /// Requirement set the findings come from
    pub requirement_set: String,
    /// Matcher findings for this interaction
    pub findings: Vec<ComplianceFinding>,
    /// Keyword groups that fired during risk scoring
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

/// Output of the narrative analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAnalysis {
    pub compliance: f64,
    pub empathy: f64,
    pub resolution: f64,
    #[serde(alias = "process_adherence")]
    pub process: f64,
    #[serde(default)]
    pub commentary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

impl NarrativeAnalysis {
    pub fn sub_scores(&self) -> SubScores {
        SubScores::new(self.compliance, self.empathy, self.resolution, self.process)
    }

    /// Every score must be a number within [0, 100].
    pub fn validate(&self) -> LlmResult<()> {
        for (dimension, value) in self.sub_scores().iter() {
            if !(0.0..=100.0).contains(&value) {
                return Err(LlmError::schema(format!(
                    "{} score {} is outside [0, 100]",
                    dimension, value
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Coaching Generation
// ============================================================================

/// Input to the narrative generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingRequest {
    pub agent_id: String,
    pub agent_name: String,
    pub average_overall: f64,
    /// Dimensions ordered weakest first
    pub weakest_dimensions: Vec<Dimension>,
    /// Descriptions of patterns this agent contributes to
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Worst-scoring interactions, worst first
    pub examples: Vec<CoachingExample>,
}

/// Output of the narrative generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingDraft {
    pub focus_areas: Vec<String>,
    pub action_items: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl CoachingDraft {
    /// Focus areas and action items must be present and non-blank.
    pub fn validate(&self) -> LlmResult<()> {
        if self.focus_areas.is_empty() {
            return Err(LlmError::schema("coaching draft has no focus areas"));
        }
        if self.action_items.is_empty() {
            return Err(LlmError::schema("coaching draft has no action items"));
        }
        if self
            .focus_areas
            .iter()
            .chain(self.action_items.iter())
            .any(|s| s.trim().is_empty())
        {
            return Err(LlmError::schema("coaching draft contains blank entries"));
        }
        Ok(())
    }
}
