// Classification error handling
// Error kinds surfaced by the engine and their HTTP rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{classifier::ScoringError, schema::SchemaMismatchError};

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Model feature mismatch - retrain model")]
    SchemaMismatch(SchemaMismatchError),

    #[error("Error making prediction")]
    Scoring(ScoringError),

    #[error("Maximum {max} URLs allowed per request")]
    BatchTooLarge { max: usize, actual: usize },

    #[error("{0}")]
    InvalidBatch(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Internal server error")]
    Internal(String),
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<ScoringError> for ClassificationError {
    fn from(err: ScoringError) -> Self {
        ClassificationError::Scoring(err)
    }
}

impl From<SchemaMismatchError> for ClassificationError {
    fn from(err: SchemaMismatchError) -> Self {
        ClassificationError::SchemaMismatch(err)
    }
}

impl From<validator::ValidationErrors> for ClassificationError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .values()
            .flat_map(|errors| {
                errors
                    .iter()
                    .map(|e| e.message.as_ref().unwrap_or(&e.code).to_string())
            })
            .collect();

        ClassificationError::InvalidRequest(messages.join(", "))
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ClassificationErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ClassificationError {
    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassificationError::BatchTooLarge { .. }
            | ClassificationError::InvalidBatch(_)
            | ClassificationError::InvalidRequest(_) => StatusCode::BAD_REQUEST,

            ClassificationError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ClassificationError::SchemaMismatch(_)
            | ClassificationError::Scoring(_)
            | ClassificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API response
    pub fn error_code(&self) -> &'static str {
        match self {
            ClassificationError::ModelUnavailable => "MODEL_NOT_LOADED",
            ClassificationError::SchemaMismatch(_) => "MODEL_FEATURE_MISMATCH",
            ClassificationError::Scoring(_) => "SCORING_FAILED",
            ClassificationError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            ClassificationError::InvalidBatch(_) => "INVALID_BATCH",
            ClassificationError::InvalidRequest(_) => "BAD_REQUEST",
            ClassificationError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create error response
    pub fn to_response(&self) -> ClassificationErrorResponse {
        let details = match self {
            ClassificationError::SchemaMismatch(e) => Some(serde_json::json!({
                "expected": e.expected,
                "actual": e.actual,
            })),
            ClassificationError::BatchTooLarge { max, actual } => {
                Some(serde_json::json!({ "max": max, "actual": actual }))
            },
            _ => None,
        };

        ClassificationErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details,
        }
    }
}

impl IntoResponse for ClassificationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

pub type ClassificationOutcome<T> = Result<T, ClassificationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ClassificationError::ModelUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ClassificationError::BatchTooLarge { max: 100, actual: 101 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClassificationError::Scoring(ScoringError::InvalidProbability(2.0)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClassificationError::ModelUnavailable.to_string(),
            "Model not loaded"
        );
        assert_eq!(
            ClassificationError::BatchTooLarge { max: 100, actual: 150 }.to_string(),
            "Maximum 100 URLs allowed per request"
        );
        assert_eq!(
            ClassificationError::Scoring(ScoringError::MalformedScaler("x".into())).to_string(),
            "Error making prediction"
        );
    }

    #[test]
    fn test_mismatch_response_details() {
        let error = ClassificationError::SchemaMismatch(SchemaMismatchError {
            expected: 12,
            actual: 10,
            missing_in_extractor: vec![],
            extra_in_extractor: vec![],
        });
        let response = error.to_response();

        assert_eq!(response.code, "MODEL_FEATURE_MISMATCH");
        assert_eq!(response.error, "Model feature mismatch - retrain model");
        let details = response.details.unwrap();
        assert_eq!(details["expected"], 12);
        assert_eq!(details["actual"], 10);
    }

    #[test]
    fn test_from_validation_errors() {
        let request = crate::models::PredictRequest {
            url: Some(String::new()),
        };
        let err: ClassificationError = request.validate().unwrap_err().into();
        assert_eq!(
            err,
            ClassificationError::InvalidRequest("URL is required".to_string())
        );
    }
}
