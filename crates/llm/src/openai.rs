//! OpenAI-Compatible Provider
//!
//! Narrative collaborators backed by a chat completions endpoint. Works with
//! OpenAI and any service exposing the same API shape via `base_url`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::provider::{extract_json, missing_api_key_error, parse_http_error, NarrativeProvider};
use super::types::{
    AnalysisRequest, CoachingDraft, CoachingRequest, LlmError, LlmResult, NarrativeAnalysis,
    ProviderConfig,
};
use crate::http_client::build_http_client;

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Upper bound on a single HTTP exchange; callers usually time out sooner.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a senior quality assurance analyst for a customer \
service operation. Score the interaction on four dimensions from 0 to 100 and respond with a \
single JSON object: {\"compliance\": number, \"empathy\": number, \"resolution\": number, \
\"process\": number, \"commentary\": string, \"strengths\": [string], \
\"improvement_areas\": [string]}. Ground the compliance score in the compliance findings \
provided. Respond with JSON only.";

const COACHING_SYSTEM_PROMPT: &str = "You are a contact center coach. Using the agent's worst \
interactions and recurring patterns, write a focused coaching plan. Respond with a single JSON \
object: {\"focus_areas\": [string], \"action_items\": [string], \"summary\": string}. Order \
focus areas by impact. Respond with JSON only.";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(REQUEST_TIMEOUT)?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Build the request body for the API
    fn build_request_body(&self, system: &str, user: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        })
    }

    /// Send one system + user exchange and return the assistant text.
    async fn complete(&self, system: &str, user: &str) -> LlmResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let body = self.build_request_body(system, user);

        let response = self
            .client
            .post(self.base_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let parsed: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::ParseError {
                message: "Response contained no message content".to_string(),
            })
    }
}

/// Render the analysis prompt for one interaction.
pub fn analysis_prompt(request: &AnalysisRequest) -> String {
    let mut prompt = format!(
        "Interaction: {}\nAgent: {}\nChannel: {}\nCustomer issue: {}\nResolution status: {}\n",
        request.interaction_id,
        request.agent_id,
        request.channel,
        request.customer_issue,
        request.resolution_status
    );

    if !request.risk_factors.is_empty() {
        prompt.push_str(&format!("Risk factors: {}\n", request.risk_factors.join(", ")));
    }

    prompt.push_str(&format!(
        "\nCompliance findings ({}):\n",
        request.requirement_set
    ));
    for finding in &request.findings {
        prompt.push_str(&format!(
            "- [{}] {}: {:?} {}\n",
            finding.severity, finding.requirement_id, finding.status, finding.evidence
        ));
    }

    prompt.push_str("\nTranscript:\n");
    prompt.push_str(&request.transcript_text);
    prompt
}

/// Render the coaching prompt for one agent.
pub fn coaching_prompt(request: &CoachingRequest) -> String {
    let weakest: Vec<&str> = request
        .weakest_dimensions
        .iter()
        .map(|d| d.display_name())
        .collect();

    let mut prompt = format!(
        "Agent: {} ({})\nAverage overall score: {:.1}\nWeakest dimensions: {}\n",
        request.agent_name,
        request.agent_id,
        request.average_overall,
        weakest.join(", ")
    );

    if !request.patterns.is_empty() {
        prompt.push_str("\nRecurring patterns:\n");
        for pattern in &request.patterns {
            prompt.push_str(&format!("- {}\n", pattern));
        }
    }

    prompt.push_str("\nWorst interactions:\n");
    for example in &request.examples {
        prompt.push_str(&format!(
            "- {} overall {:.1}, weakest {}, violations [{}]",
            example.interaction_id,
            example.overall,
            example.weakest_dimension.display_name(),
            example.violated_requirements.join(", ")
        ));
        if !example.improvement_areas.is_empty() {
            prompt.push_str(&format!(
                ", noted: {}",
                example.improvement_areas.join("; ")
            ));
        }
        prompt.push('\n');
    }
    prompt
}

#[async_trait]
impl NarrativeProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn analyze_interaction(
        &self,
        request: &AnalysisRequest,
    ) -> LlmResult<NarrativeAnalysis> {
        let text = self
            .complete(ANALYSIS_SYSTEM_PROMPT, &analysis_prompt(request))
            .await?;
        debug!(
            "[OpenAIProvider] analysis response for {} ({} chars)",
            request.interaction_id,
            text.len()
        );
        let analysis: NarrativeAnalysis = extract_json(&text)?;
        analysis.validate()?;
        Ok(analysis)
    }

    async fn draft_coaching_plan(&self, request: &CoachingRequest) -> LlmResult<CoachingDraft> {
        let text = self
            .complete(COACHING_SYSTEM_PROMPT, &coaching_prompt(request))
            .await?;
        let draft: CoachingDraft = extract_json(&text)?;
        draft.validate()?;
        Ok(draft)
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
