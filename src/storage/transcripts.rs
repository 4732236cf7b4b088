//! Transcript Batch Loading
//!
//! Accepts either `{"transcripts": [...]}` or a bare JSON array. Each record
//! is decoded on its own: one that does not decode as a transcript (null or
//! wrongly typed fields) is set aside as a `MalformedInput` issue and the
//! rest of the batch still loads. Field-level validation happens at
//! ingestion.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use qa_auditor_core::Transcript;

use crate::models::{IssueKind, RunIssue};
use crate::utils::error::{AppError, AppResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatch {
    Wrapped { transcripts: Vec<Value> },
    Bare(Vec<Value>),
}

/// A decoded batch: the transcripts plus the records that did not decode.
#[derive(Debug, Clone, Default)]
pub struct TranscriptBatch {
    pub transcripts: Vec<Transcript>,
    pub rejected: Vec<RunIssue>,
}

impl TranscriptBatch {
    /// Number of records in the input, decoded or not.
    pub fn received(&self) -> usize {
        self.transcripts.len() + self.rejected.len()
    }
}

impl From<Vec<Transcript>> for TranscriptBatch {
    fn from(transcripts: Vec<Transcript>) -> Self {
        Self {
            transcripts,
            rejected: Vec::new(),
        }
    }
}

/// Parse a transcript batch from JSON text.
///
/// Fails only when the document is not a batch at all.
pub fn parse_transcripts(content: &str) -> AppResult<TranscriptBatch> {
    let raw: RawBatch = serde_json::from_str(content).map_err(|e| {
        AppError::malformed_input(format!(
            "expected {{\"transcripts\": [...]}} or a JSON array: {}",
            e
        ))
    })?;
    let records = match raw {
        RawBatch::Wrapped { transcripts } => transcripts,
        RawBatch::Bare(records) => records,
    };

    let mut batch = TranscriptBatch::default();
    for (index, record) in records.into_iter().enumerate() {
        let interaction_id = string_field(&record, "interaction_id");
        let agent_id = string_field(&record, "agent_id");

        match serde_json::from_value::<Transcript>(record) {
            Ok(transcript) => batch.transcripts.push(transcript),
            Err(e) => {
                let label = interaction_id.clone().unwrap_or_else(|| format!("#{}", index + 1));
                warn!("[Transcripts] Record {} does not decode: {}", label, e);
                let mut issue = RunIssue::new(
                    IssueKind::MalformedInput,
                    format!("record {} is not a valid transcript: {}", label, e),
                );
                if let Some(id) = interaction_id {
                    issue = issue.for_interaction(id);
                }
                if let Some(id) = agent_id {
                    issue = issue.for_agent(id);
                }
                batch.rejected.push(issue);
            }
        }
    }
    Ok(batch)
}

/// Load a transcript batch from a JSON file.
pub fn load_transcripts(path: &Path) -> AppResult<TranscriptBatch> {
    let content = fs::read_to_string(path)?;
    let batch = parse_transcripts(&content)?;
    info!(
        "[Transcripts] Loaded {} of {} record(s) from {}",
        batch.transcripts.len(),
        batch.received(),
        path.display()
    );
    Ok(batch)
}

/// String value of `key` when the record is an object holding one.
fn string_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
