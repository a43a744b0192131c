pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use classifier::{create_classifier, Classifier, ClassifierError, StubClassifier};
pub use config::ScribeConfig;
pub use error::ScribeError;
pub use models::{AnalyzeRequest, AnalyzeResponse, Classification, ClassificationRecord};
pub use service::ClassificationService;
pub use store::ClassificationStore;
