// Classification request and result shapes

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::feature_extractor::FeatureVector;

pub const TRUSTED_DOMAIN_REASON: &str = "Trusted domain";

// =============================================================================
// REQUEST MODELS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BulkPredictRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "URLs array is required"))]
    pub urls: Option<Vec<String>>,
}

// =============================================================================
// RESULT MODELS
// =============================================================================

/// Feature payload attached to a result. Trusted-domain short-circuits
/// carry only the domain, not the lexical vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultFeatures {
    Lexical(FeatureVector),
    Trusted { domain_trusted: bool, domain: String },
}

impl ResultFeatures {
    pub fn trusted(domain: impl Into<String>) -> Self {
        ResultFeatures::Trusted {
            domain_trusted: true,
            domain: domain.into(),
        }
    }

    pub fn lexical(&self) -> Option<&FeatureVector> {
        match self {
            ResultFeatures::Lexical(vector) => Some(vector),
            ResultFeatures::Trusted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub is_phishing: bool,
    pub confidence: f64,
    pub features: ResultFeatures,
    /// Only set for trusted-domain short-circuits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ClassificationResult {
    pub fn is_trusted_short_circuit(&self) -> bool {
        matches!(self.features, ResultFeatures::Trusted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub url: String,
    pub error: String,
}

/// One batch slot, same position as its input URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchItemResult {
    Classified {
        url: String,
        #[serde(flatten)]
        result: ClassificationResult,
    },
    Failed(ItemError),
}

impl BatchItemResult {
    pub fn url(&self) -> &str {
        match self {
            BatchItemResult::Classified { url, .. } => url,
            BatchItemResult::Failed(e) => &e.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchItemResult::Classified { .. })
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            BatchItemResult::Classified { result, .. } => Some(result),
            BatchItemResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BatchItemResult::Classified { .. } => None,
            BatchItemResult::Failed(e) => Some(&e.error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchItemResult>,
    pub total: usize,
    pub successful: usize,
}

impl BatchReport {
    pub fn new(results: Vec<BatchItemResult>) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            successful,
            results,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.successful
    }
}

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_count: Option<usize>,
    pub schema_compatible: bool,
    pub trusted_domains: usize,
    pub trusted_domains_version: String,
}
