//! Narrative Provider Trait
//!
//! The capability interface for the two external collaborators: per
//! interaction narrative analysis and per agent coaching generation.
//! Implementations may call an LLM, a rule engine or a test double; callers
//! apply timeouts and retries around them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::types::{
    AnalysisRequest, CoachingDraft, CoachingRequest, LlmError, LlmResult, NarrativeAnalysis,
    ProviderConfig, ProviderKind,
};
use crate::heuristic::HeuristicProvider;
use crate::openai::OpenAIProvider;

/// Trait that all narrative backends implement.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Score one interaction on the four dimensions with commentary.
    ///
    /// Implementations return a validated record or an error; they never
    /// clamp out-of-range scores.
    async fn analyze_interaction(&self, request: &AnalysisRequest)
        -> LlmResult<NarrativeAnalysis>;

    /// Draft coaching plan content for one agent.
    async fn draft_coaching_plan(&self, request: &CoachingRequest) -> LlmResult<CoachingDraft>;
}

/// Build the backend selected by `config`.
pub fn create_provider(config: &ProviderConfig) -> LlmResult<Arc<dyn NarrativeProvider>> {
    match config.provider {
        ProviderKind::Heuristic => Ok(Arc::new(HeuristicProvider::new())),
        ProviderKind::OpenAi => Ok(Arc::new(OpenAIProvider::new(config.clone())?)),
    }
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Extract a JSON record from free-form model output.
///
/// Tries the whole response first, then the span from the first `{` to the
/// last `}` (covers markdown fences and surrounding prose).
pub fn extract_json<T: DeserializeOwned>(response: &str) -> LlmResult<T> {
    let direct = match serde_json::from_str::<T>(response.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return serde_json::from_str::<T>(&response[start..=end]).map_err(|e| {
                LlmError::ParseError {
                    message: format!("Failed to parse embedded JSON: {}", e),
                }
            });
        }
    }

    Err(LlmError::ParseError {
        message: format!("No JSON object in response: {}", direct),
    })
}
