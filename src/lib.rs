//! QA Auditor
//!
//! Batch quality auditing of customer-service transcripts. The library
//! exposes the run configuration, the flow orchestrator and file
//! persistence; the deterministic tools, shared records and narrative
//! backends live in the workspace crates it re-exports.
//!
//! ## Module Organization
//!
//! - `models` - Run configuration, flow state, issues and report records
//! - `services` - The `QaAuditorFlow` orchestrator and its stages
//! - `storage` - Configuration, transcript and output files
//! - `utils` - Application error type

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::{AuditConfig, FlowStage, FlowState, IssueKind, RunIssue};
pub use services::QaAuditorFlow;
pub use utils::error::{AppError, AppResult};
