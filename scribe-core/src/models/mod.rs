pub mod classification;

pub use classification::{
    AnalyzeRequest, AnalyzeResponse, Classification, ClassificationRecord, SUCCESS_STATUS,
};
