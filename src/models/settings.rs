//! Settings Models
//!
//! Audit run configuration, loaded from TOML. Every field has a default so
//! an empty file (or no file at all) yields a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use qa_auditor_llm::ProviderConfig;
use qa_auditor_tools::{PatternThresholds, RiskThresholds};

/// Top-level audit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Run metadata and policies
    #[serde(default)]
    pub run: RunSettings,
    /// Worker pool sizing
    #[serde(default)]
    pub workers: WorkerSettings,
    /// Timeout and retry budget for external collaborators
    #[serde(default)]
    pub collaborator: CollaboratorSettings,
    /// Risk, pattern and coaching thresholds
    #[serde(default)]
    pub thresholds: ThresholdSettings,
    /// Narrative backend selection
    #[serde(default)]
    pub llm: ProviderConfig,
    /// Optional rule book overriding the built-in tables
    #[serde(default)]
    pub rulebook: Option<PathBuf>,
}

/// Run metadata and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Campaign shown on every report
    #[serde(default = "default_campaign_name")]
    pub campaign_name: String,
    /// Free-form evaluation period label
    #[serde(default)]
    pub evaluation_period: String,
    /// Weight profile for all overall scores
    #[serde(default = "default_weight_profile")]
    pub weight_profile: String,
    /// Requirement set used when a transcript carries no hint
    #[serde(default = "default_requirement_set")]
    pub default_requirement_set: String,
    /// Abort the run on the first malformed transcript
    #[serde(default)]
    pub fail_fast_on_malformed: bool,
    /// Directory receiving the output files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_campaign_name() -> String {
    "QA Audit".to_string()
}

fn default_weight_profile() -> String {
    "standard".to_string()
}

fn default_requirement_set() -> String {
    "general".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            campaign_name: default_campaign_name(),
            evaluation_period: String::new(),
            weight_profile: default_weight_profile(),
            default_requirement_set: default_requirement_set(),
            fail_fast_on_malformed: false,
            output_dir: default_output_dir(),
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Maximum interactions analyzed concurrently
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_max_parallel() -> usize {
    4
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
        }
    }
}

/// Timeout and retry budget for external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorSettings {
    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Ceiling for a single backoff wait
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl CollaboratorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(
            self.retry_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

/// Risk, pattern and coaching thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSettings {
    /// Risk score tiers
    #[serde(default)]
    pub risk: RiskThresholds,
    /// Pattern classification and coaching eligibility
    #[serde(default)]
    pub patterns: PatternThresholds,
    /// Uniform sub-score assigned to LOW-risk interactions
    #[serde(default = "default_pass_score")]
    pub default_pass_score: f64,
    /// Sub-score assigned when narrative analysis is unavailable
    #[serde(default = "default_degraded_score")]
    pub degraded_score: f64,
    /// Worst interactions included in each coaching request
    #[serde(default = "default_coaching_examples")]
    pub coaching_examples: usize,
}

fn default_pass_score() -> f64 {
    80.0
}

fn default_degraded_score() -> f64 {
    50.0
}

fn default_coaching_examples() -> usize {
    3
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            risk: RiskThresholds::default(),
            patterns: PatternThresholds::default(),
            default_pass_score: default_pass_score(),
            degraded_score: default_degraded_score(),
            coaching_examples: default_coaching_examples(),
        }
    }
}

impl AuditConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: AuditConfig =
            toml::from_str(content).map_err(|e| format!("Invalid configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.run.weight_profile.trim().is_empty() {
            return Err("run.weight_profile must not be empty".to_string());
        }
        if self.run.default_requirement_set.trim().is_empty() {
            return Err("run.default_requirement_set must not be empty".to_string());
        }
        if self.workers.max_parallel == 0 {
            return Err("workers.max_parallel must be at least 1".to_string());
        }
        if self.collaborator.timeout_ms == 0 {
            return Err("collaborator.timeout_ms must be greater than 0".to_string());
        }
        if self.collaborator.max_retries > 10 {
            return Err("collaborator.max_retries cannot exceed 10".to_string());
        }
        for (name, value) in [
            ("thresholds.default_pass_score", self.thresholds.default_pass_score),
            ("thresholds.degraded_score", self.thresholds.degraded_score),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{} must be within [0, 100], got {}", name, value));
            }
        }
        if self.thresholds.coaching_examples == 0 {
            return Err("thresholds.coaching_examples must be at least 1".to_string());
        }
        self.thresholds.risk.validate().map_err(String::from)?;
        self.thresholds.patterns.validate().map_err(String::from)?;
        Ok(())
    }
}
