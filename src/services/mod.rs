//! Services
//!
//! Business logic for the auditor. The flow orchestrator drives the
//! deterministic tools and the narrative collaborator through one run.

pub mod flow;

pub use flow::{CollaboratorFailure, QaAuditorFlow};
