//! Classification service: orchestrates analyze and lookup requests
//!
//! `analyze` runs the classifier, builds a record and stores it. The classifier
//! call is bounded by a timeout, and any classifier failure aborts the request
//! before anything is written to the store.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::classifier::{create_classifier, Classifier, ClassifierError};
use crate::config::ScribeConfig;
use crate::error::ScribeError;
use crate::models::{AnalyzeRequest, AnalyzeResponse, ClassificationRecord};
use crate::store::ClassificationStore;

#[derive(Clone)]
pub struct ClassificationService {
    store: Arc<ClassificationStore>,
    classifier: Arc<dyn Classifier>,
    timeout: Duration,
}

impl ClassificationService {
    pub fn new(
        store: Arc<ClassificationStore>,
        classifier: Arc<dyn Classifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            classifier,
            timeout,
        }
    }

    /// Fresh store plus the classifier selected by `[classifier] backend`.
    /// An unknown backend is a configuration error, not a classification one.
    pub fn from_config(config: &ScribeConfig) -> Result<Self, ScribeError> {
        let classifier = create_classifier(&config.classifier)
            .map_err(|e| ::config::ConfigError::Message(e.to_string()))?;
        Ok(Self::new(
            Arc::new(ClassificationStore::new()),
            Arc::from(classifier),
            Duration::from_millis(config.classifier.timeout_ms),
        ))
    }

    pub fn store(&self) -> &ClassificationStore {
        &self.store
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Parse a raw body and analyze it.
    pub async fn analyze_body(&self, body: &[u8]) -> Result<AnalyzeResponse, ScribeError> {
        let request = AnalyzeRequest::from_slice(body)?;
        self.analyze(request).await
    }

    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, ScribeError> {
        let AnalyzeRequest {
            transcript_id,
            transcript_text,
            creator_id,
        } = request;

        let analysis_id = Uuid::new_v4().to_string();

        let classification = match tokio::time::timeout(
            self.timeout,
            self.classifier.classify(&transcript_text),
        )
        .await
        {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    classifier = self.classifier.name(),
                    transcript_id = %transcript_id,
                    "Classification failed; nothing stored"
                );
                return Err(e.into());
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(
                    timeout_ms,
                    classifier = self.classifier.name(),
                    transcript_id = %transcript_id,
                    "Classifier timed out; nothing stored"
                );
                return Err(ClassifierError::Timeout { timeout_ms }.into());
            }
        };

        let record = self.store.insert(ClassificationRecord::new(
            analysis_id,
            transcript_id,
            creator_id,
            classification,
        ));

        tracing::info!(
            analysis_id = %record.analysis_id,
            transcript_id = %record.transcript_id,
            creator_id = %record.creator_id,
            classifier = self.classifier.name(),
            "Stored classification"
        );

        Ok(AnalyzeResponse::from(record.as_ref()))
    }

    pub fn get_result(&self, analysis_id: &str) -> Result<Arc<ClassificationRecord>, ScribeError> {
        let result = self.store.lookup(analysis_id);
        if result.is_err() {
            tracing::debug!(analysis_id, "Analysis not found");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StubClassifier;
    use crate::models::{Classification, SUCCESS_STATUS};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashSet;

    /// Echoes the transcript text back inside every payload.
    struct EchoClassifier;

    #[async_trait]
    impl Classifier for EchoClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
            Ok(Classification {
                entities: json!({"text": text}),
                tone: json!({"len": text.len()}),
                style: json!({"upper": text.to_uppercase()}),
                safety_flags: json!({"empty": text.is_empty()}),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            Err(ClassifierError::Backend("model offline".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            EchoClassifier.classify(text).await
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn service_with(classifier: Arc<dyn Classifier>, timeout: Duration) -> ClassificationService {
        ClassificationService::new(Arc::new(ClassificationStore::new()), classifier, timeout)
    }

    fn request(transcript_id: &str, text: &str, creator_id: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            transcript_id: transcript_id.to_string(),
            transcript_text: text.to_string(),
            creator_id: creator_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_then_get_round_trip() {
        let service = service_with(Arc::new(StubClassifier), Duration::from_secs(1));
        let before = Utc::now();

        let resp = service.analyze(request("t1", "hello", "c1")).await.unwrap();
        assert_eq!(resp.status, SUCCESS_STATUS);
        assert!(!resp.analysis_id.is_empty());
        assert!(Uuid::parse_str(&resp.analysis_id).is_ok());

        let record = service.get_result(&resp.analysis_id).unwrap();
        assert_eq!(record.analysis_id, resp.analysis_id);
        assert_eq!(record.transcript_id, "t1");
        assert_eq!(record.creator_id, "c1");
        assert_eq!(record.entities, resp.entities);
        assert_eq!(record.tone, resp.tone);
        assert_eq!(record.style, resp.style);
        assert_eq!(record.safety_flags, resp.safety_flags);
        assert!(record.created_at >= before);
        assert!(record.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_analyze_generates_unique_ids() {
        let service = service_with(Arc::new(StubClassifier), Duration::from_secs(1));
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let resp = service.analyze(request("t", "x", "c")).await.unwrap();
            assert!(seen.insert(resp.analysis_id), "analysis_id reused");
        }
        assert_eq!(service.store().len(), 200);
    }

    #[tokio::test]
    async fn test_analyze_accepts_empty_strings() {
        let service = service_with(Arc::new(EchoClassifier), Duration::from_secs(1));
        let resp = service.analyze(request("", "", "")).await.unwrap();
        let record = service.get_result(&resp.analysis_id).unwrap();
        assert_eq!(record.transcript_id, "");
        assert_eq!(record.safety_flags["empty"], true);
    }

    #[tokio::test]
    async fn test_analyze_body_missing_text_is_bad_request() {
        let service = service_with(Arc::new(StubClassifier), Duration::from_secs(1));
        let result = service
            .analyze_body(br#"{"transcript_id":"t1","creator_id":"c1"}"#)
            .await;
        assert!(matches!(result, Err(ScribeError::BadRequest(_))));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_get_result_unknown_ids() {
        let service = service_with(Arc::new(StubClassifier), Duration::from_secs(1));
        service.analyze(request("t1", "hello", "c1")).await.unwrap();

        for id in ["", "nonexistent-id", "123e4567-e89b-12d3-a456-426614174000", "123e4567-zzzz"] {
            assert!(matches!(service.get_result(id), Err(ScribeError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_classifier_failure_stores_nothing() {
        let service = service_with(Arc::new(FailingClassifier), Duration::from_secs(1));
        let result = service.analyze(request("t1", "hello", "c1")).await;
        match result {
            Err(ScribeError::ClassificationFailed(ClassifierError::Backend(msg))) => {
                assert_eq!(msg, "model offline")
            }
            other => panic!("expected classifier failure, got {:?}", other.map(|r| r.analysis_id)),
        }
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_classifier_timeout_stores_nothing() {
        let service = service_with(Arc::new(SlowClassifier), Duration::from_millis(100));
        let result = service.analyze(request("t1", "hello", "c1")).await;
        assert!(matches!(
            result,
            Err(ScribeError::ClassificationFailed(ClassifierError::Timeout { timeout_ms: 100 }))
        ));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_from_config_uses_configured_timeout_and_stub() {
        let mut config = ScribeConfig::default();
        config.classifier.timeout_ms = 250;
        let service = ClassificationService::from_config(&config).unwrap();
        assert_eq!(service.classifier_name(), "stub");
        assert_eq!(service.timeout, Duration::from_millis(250));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_from_config_unknown_backend_is_config_error() {
        let mut config = ScribeConfig::default();
        config.classifier.backend = "nope".to_string();
        match ClassificationService::from_config(&config) {
            Err(ScribeError::Config(e)) => {
                assert!(e.to_string().contains("Unknown classifier backend: nope"), "got: {}", e)
            }
            Err(e) => panic!("expected config error, got: {}", e),
            Ok(_) => panic!("unknown backend must be rejected"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_analyze_no_lost_writes() {
        let service = service_with(Arc::new(EchoClassifier), Duration::from_secs(5));

        let tasks: Vec<_> = (0..128)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    let text = format!("transcript body {}", i);
                    let resp = service
                        .analyze(request(&format!("t{}", i), &text, &format!("c{}", i)))
                        .await
                        .unwrap();
                    (i, resp.analysis_id)
                })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;

        let mut ids = HashSet::new();
        for joined in results {
            let (i, id) = joined.unwrap();
            assert!(ids.insert(id.clone()));

            let record = service.get_result(&id).unwrap();
            assert_eq!(record.transcript_id, format!("t{}", i));
            assert_eq!(record.creator_id, format!("c{}", i));
            assert_eq!(record.entities["text"], format!("transcript body {}", i));
        }
        assert_eq!(ids.len(), 128);
        assert_eq!(service.store().len(), 128);
    }
}
