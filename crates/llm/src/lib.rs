//! QA Auditor LLM
//!
//! Backends for the two external narrative collaborators:
//! - Heuristic (deterministic rule-based scoring, no network)
//! - OpenAI-compatible chat completions (OpenAI, Azure-style gateways, local servers)
//!
//! Also includes the request/response contracts with schema validation and
//! the HTTP client factory.

pub mod heuristic;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use heuristic::{rule_based_draft, HeuristicProvider};
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::{create_provider, extract_json, NarrativeProvider};
pub use types::*;
