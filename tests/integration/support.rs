//! Mock providers and builders shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use qa_auditor::models::{AuditConfig, CollaboratorSettings};
use qa_auditor::QaAuditorFlow;
use qa_auditor_core::Transcript;
use qa_auditor_llm::{
    AnalysisRequest, CoachingDraft, CoachingRequest, LlmError, LlmResult, NarrativeAnalysis,
    NarrativeProvider,
};
use qa_auditor_tools::RuleBook;

/// How a mock answers.
#[derive(Clone)]
pub enum Behavior {
    /// Uniform sub-scores
    Scores(f64),
    /// Always fail with this error
    Fail(LlmError),
    /// Sleep before answering with uniform 85s
    Slow(Duration),
}

/// Configurable provider that counts calls and tracks concurrency.
pub struct MockProvider {
    pub analysis: Behavior,
    pub coaching: Behavior,
    pub analysis_calls: AtomicUsize,
    pub coaching_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new(analysis: Behavior, coaching: Behavior) -> Arc<Self> {
        Arc::new(Self {
            analysis,
            coaching,
            analysis_calls: AtomicUsize::new(0),
            coaching_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn scoring(score: f64) -> Arc<Self> {
        Self::new(Behavior::Scores(score), Behavior::Scores(score))
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    pub fn coaching_calls(&self) -> usize {
        self.coaching_calls.load(Ordering::SeqCst)
    }

    async fn behave(&self, behavior: &Behavior) -> LlmResult<f64> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = match behavior {
            Behavior::Scores(score) => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(*score)
            }
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(85.0)
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl NarrativeProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze_interaction(&self, request: &AnalysisRequest) -> LlmResult<NarrativeAnalysis> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        let score = self.behave(&self.analysis).await?;
        Ok(NarrativeAnalysis {
            compliance: score,
            empathy: score,
            resolution: score,
            process: score,
            commentary: format!("mock analysis of {}", request.interaction_id),
            strengths: vec!["Polite greeting".to_string()],
            improvement_areas: Vec::new(),
        })
    }

    async fn draft_coaching_plan(&self, request: &CoachingRequest) -> LlmResult<CoachingDraft> {
        self.coaching_calls.fetch_add(1, Ordering::SeqCst);
        self.behave(&self.coaching).await?;
        Ok(CoachingDraft {
            focus_areas: vec![format!("Coaching for {}", request.agent_name)],
            action_items: vec!["Shadow a senior agent".to_string()],
            summary: None,
        })
    }
}

/// Defaults with a fast retry budget.
pub fn fast_config() -> AuditConfig {
    let mut config = AuditConfig::default();
    config.run.campaign_name = "Acme Support".to_string();
    config.run.evaluation_period = "2026-09".to_string();
    config.collaborator = CollaboratorSettings {
        timeout_ms: 200,
        max_retries: 1,
        retry_backoff_ms: 1,
        max_backoff_ms: 5,
    };
    config
}

pub fn flow_with(config: AuditConfig, provider: Arc<dyn NarrativeProvider>) -> QaAuditorFlow {
    QaAuditorFlow::new(config, RuleBook::default(), provider).unwrap()
}

/// Voice call that reads the card number back (CRITICAL).
pub fn card_readback(id: &str, agent: &str) -> Transcript {
    Transcript::new(
        id,
        agent,
        format!("Agent {}", agent),
        "voice",
        "Agent: Thank you for calling, this call may be recorded. For security purposes, \
         can you confirm your name? Customer: Sure. Agent: Great, your card number is \
         4111 1111 1111 1111, correct?",
    )
    .with_outcome("billing", "resolved")
}

/// Email with no red flags (LOW).
pub fn quiet_email(id: &str, agent: &str) -> Transcript {
    Transcript::new(
        id,
        agent,
        format!("Agent {}", agent),
        "email",
        "Hello, thanks for reaching out. Your refund has been processed and should \
         appear within five business days. Kind regards.",
    )
    .with_outcome("refund", "resolved")
}

/// Voice call without the recording disclosure (MEDIUM).
pub fn missing_disclosure(id: &str, agent: &str) -> Transcript {
    Transcript::new(
        id,
        agent,
        format!("Agent {}", agent),
        "voice",
        "Agent: Hello, can you confirm your name please? Customer: Yes. \
         Agent: Thanks, your address is updated.",
    )
    .with_outcome("address change", "resolved")
}
