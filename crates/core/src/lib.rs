//! QA Auditor Core
//!
//! Foundational error types and shared domain records for the QA Auditor
//! workspace. This crate has zero dependencies on application-level code
//! (orchestration, LLM backends, configuration loading).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `severity` - Severity levels shared by flags, findings and insights
//! - `transcript` - Input transcript records
//! - `risk` - Red flag scanner output (`RiskScore`, `RiskFlag`, `Priority`)
//! - `evaluation` - Compliance findings and QA evaluations
//! - `insight` - Pattern insights and coaching plans

pub mod error;
pub mod evaluation;
pub mod insight;
pub mod risk;
pub mod severity;
pub mod transcript;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Domain Records ─────────────────────────────────────────────────────
pub use evaluation::{
    ComplianceFinding, Dimension, EvaluationStatus, Evidence, FindingStatus, PerformanceBand,
    QaEvaluation, SubScores,
};
pub use insight::{
    CoachingExample, CoachingPlan, PatternInsight, PatternKey, PatternScope, PlanSource,
};
pub use risk::{FlagCategory, Priority, RiskFlag, RiskScore};
pub use severity::Severity;
pub use transcript::{channel_requires_disclosure, Transcript};
