//! Classifier module for Scribe: pluggable transcript classification
//!
//! Provides a `Classifier` trait with implementations for:
//! - **Stub**: fixed placeholder payloads for any input (no real analysis)
//!
//! The service depends only on the trait, so tests substitute their own fakes.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::ClassifierConfig;
use crate::models::Classification;

/// Backend name of the placeholder classifier.
pub const STUB_BACKEND: &str = "stub";

// ============================================================================
// Classifier trait
// ============================================================================

/// Abstraction over classification providers.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Derive entities, tone, style and safety flags from transcript text.
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Unknown classifier backend: {0}")]
    UnknownBackend(String),

    #[error("Classifier timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Classifier backend error: {0}")]
    Backend(String),
}

/// Create the classifier selected by `[classifier] backend`.
pub fn create_classifier(config: &ClassifierConfig) -> Result<Box<dyn Classifier>, ClassifierError> {
    match config.backend.as_str() {
        STUB_BACKEND => Ok(Box::new(StubClassifier)),
        other => Err(ClassifierError::UnknownBackend(other.to_string())),
    }
}

// ============================================================================
// StubClassifier
// ============================================================================

/// Returns the same placeholder classification for every transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubClassifier;

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
        Ok(Classification {
            entities: json!({
                "people": ["Tim Ferriss"],
                "tools": ["Notion"],
                "brands": [],
                "products": ["The 4-Hour Workweek"],
                "companies": [],
            }),
            tone: json!({
                "primary": "conversational",
                "secondary": "educational",
                "confidence": 0.88,
            }),
            style: json!({
                "primary": "interview",
                "confidence": 0.92,
            }),
            safety_flags: json!({
                "sensitive_domains": ["mental health"],
                "severity": "low",
                "requires_review": false,
            }),
        })
    }

    fn name(&self) -> &str {
        STUB_BACKEND
    }
}

// ============================================================================
// TESTS
// ============================================================================
