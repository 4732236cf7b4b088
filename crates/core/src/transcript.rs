//! Transcript Input Records
//!
//! The immutable input of an audit run. String fields default to empty on
//! deserialization so that a record with a missing field still loads and is
//! rejected by [`Transcript::validate`] instead of failing the whole batch.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A single customer-service interaction transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique interaction identifier
    #[serde(default)]
    pub interaction_id: String,
    /// Agent identifier
    #[serde(default)]
    pub agent_id: String,
    /// Agent display name
    #[serde(default)]
    pub agent_name: String,
    /// Channel: "voice", "chat", "email", ...
    #[serde(default)]
    pub channel: String,
    /// Interaction timestamp as provided by the source system
    #[serde(default)]
    pub timestamp: String,
    /// Duration in seconds, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Full transcript text
    #[serde(default)]
    pub transcript_text: String,
    /// Customer issue summary
    #[serde(default)]
    pub customer_issue: String,
    /// Resolution status reported by the source system
    #[serde(default)]
    pub resolution_status: String,
    /// Requirement set hint (e.g. "pci_dss" for payment lines)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_set: Option<String>,
}

impl Transcript {
    /// Create a transcript with the required fields set.
    pub fn new(
        interaction_id: impl Into<String>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        channel: impl Into<String>,
        transcript_text: impl Into<String>,
    ) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            channel: channel.into(),
            timestamp: String::new(),
            duration_seconds: None,
            transcript_text: transcript_text.into(),
            customer_issue: String::new(),
            resolution_status: String::new(),
            requirement_set: None,
        }
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the customer issue and resolution status
    pub fn with_outcome(
        mut self,
        customer_issue: impl Into<String>,
        resolution_status: impl Into<String>,
    ) -> Self {
        self.customer_issue = customer_issue.into();
        self.resolution_status = resolution_status.into();
        self
    }

    /// Set the requirement set hint
    pub fn with_requirement_set(mut self, set: impl Into<String>) -> Self {
        self.requirement_set = Some(set.into());
        self
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("interaction_id", &self.interaction_id),
            ("agent_id", &self.agent_id),
            ("agent_name", &self.agent_name),
            ("channel", &self.channel),
            ("transcript_text", &self.transcript_text),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            let id = if self.interaction_id.trim().is_empty() {
                "<unknown>"
            } else {
                self.interaction_id.as_str()
            };
            Err(CoreError::validation(format!(
                "transcript {} is missing required field(s): {}",
                id,
                missing.join(", ")
            )))
        }
    }

    /// Whether a recording disclosure is expected on this channel.
    pub fn requires_recording_disclosure(&self) -> bool {
        channel_requires_disclosure(&self.channel)
    }
}

/// Voice and chat interactions must announce recording; email does not.
pub fn channel_requires_disclosure(channel: &str) -> bool {
    matches!(channel.trim().to_ascii_lowercase().as_str(), "voice" | "chat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transcript() {
        let t = Transcript::new("INT-1", "AG-1", "Dana", "voice", "Hello there");
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_reported() {
        let json = r#"{"interaction_id": "INT-9", "channel": "chat", "transcript_text": "hi"}"#;
        let t: Transcript = serde_json::from_str(json).unwrap();
        let err = t.validate().unwrap_err().to_string();
        assert!(err.contains("INT-9"));
        assert!(err.contains("agent_id"));
        assert!(err.contains("agent_name"));
    }

    #[test]
    fn test_blank_text_is_malformed() {
        let t = Transcript::new("INT-1", "AG-1", "Dana", "voice", "   ");
        assert!(matches!(t.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_disclosure_channels() {
        assert!(channel_requires_disclosure("Voice"));
        assert!(channel_requires_disclosure("chat"));
        assert!(!channel_requires_disclosure("email"));
    }

    #[test]
    fn test_optional_fields_skipped_when_absent() {
        let t = Transcript::new("INT-1", "AG-1", "Dana", "email", "text");
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("duration_seconds"));
        assert!(!json.contains("requirement_set"));
    }
}
