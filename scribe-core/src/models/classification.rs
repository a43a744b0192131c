use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `status` value carried by every successful analyze response.
pub const SUCCESS_STATUS: &str = "success";

/// Output of a classifier: four free-form payloads passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub entities: serde_json::Value,
    pub tone: serde_json::Value,
    pub style: serde_json::Value,
    pub safety_flags: serde_json::Value,
}

/// A stored analysis, keyed by `analysis_id`. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub analysis_id: String,
    pub transcript_id: String,
    pub creator_id: String,
    pub entities: serde_json::Value,
    pub tone: serde_json::Value,
    pub style: serde_json::Value,
    pub safety_flags: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ClassificationRecord {
    pub fn new(
        analysis_id: String,
        transcript_id: String,
        creator_id: String,
        classification: Classification,
    ) -> Self {
        let Classification {
            entities,
            tone,
            style,
            safety_flags,
        } = classification;

        Self {
            analysis_id,
            transcript_id,
            creator_id,
            entities,
            tone,
            style,
            safety_flags,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub transcript_id: String,
    pub transcript_text: String,
    pub creator_id: String,
}

impl AnalyzeRequest {
    /// Parse a raw request body. All three fields are required; empty strings
    /// are accepted as-is.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub analysis_id: String,
    pub entities: serde_json::Value,
    pub tone: serde_json::Value,
    pub style: serde_json::Value,
    pub safety_flags: serde_json::Value,
}

impl From<&ClassificationRecord> for AnalyzeResponse {
    fn from(record: &ClassificationRecord) -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            analysis_id: record.analysis_id.clone(),
            entities: record.entities.clone(),
            tone: record.tone.clone(),
            style: record.style.clone(),
            safety_flags: record.safety_flags.clone(),
        }
    }
}
