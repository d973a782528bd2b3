// URL classification handlers
// Single and bulk prediction over the shared engine

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    models::{
        BatchItemResult, BatchReport, BulkPredictRequest, ClassificationResult, PredictRequest,
    },
    utils::{ClassificationError, ScanAuditor},
};

pub const URL_REQUIRED: &str = "URL is required";
pub const URLS_REQUIRED: &str = "URLs array is required";

/// POST /api/predict
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ClassificationError> {
    let Json(request) = payload.map_err(|e| {
        warn!("Prediction attempt with unreadable body: {}", e);
        ClassificationError::InvalidRequest(URL_REQUIRED.to_string())
    })?;

    request.validate()?;
    let url = request.url.ok_or_else(|| {
        warn!("Prediction attempt with missing URL");
        ClassificationError::InvalidRequest(URL_REQUIRED.to_string())
    })?;

    match state.engine.classify_one(&url) {
        Ok(result) => {
            ScanAuditor::log_result(&url, &result);
            info!(
                "Prediction complete for {}: {}",
                url,
                if result.is_phishing { "phishing" } else { "legitimate" }
            );
            Ok(Json(result))
        },
        Err(e) => {
            ScanAuditor::log_failure(&url, &e.to_string());
            Err(e)
        },
    }
}

/// POST /api/predict/bulk
pub async fn predict_bulk(
    State(state): State<AppState>,
    payload: Result<Json<BulkPredictRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, ClassificationError> {
    let invalid = || ClassificationError::InvalidBatch(URLS_REQUIRED.to_string());

    let Json(request) = payload.map_err(|e| {
        warn!("Bulk scan with unreadable body: {}", e);
        invalid()
    })?;
    request.validate().map_err(|_| invalid())?;
    let urls = request.urls.ok_or_else(invalid)?;

    let engine = Arc::clone(&state.engine);
    let report = tokio::task::spawn_blocking(move || engine.classify_many(&urls))
        .await
        .map_err(|e| {
            error!("Bulk scan worker failed: {}", e);
            ClassificationError::Internal(e.to_string())
        })??;

    for item in &report.results {
        match item {
            BatchItemResult::Classified { url, result } => ScanAuditor::log_result(url, result),
            BatchItemResult::Failed(e) => ScanAuditor::log_failure(&e.url, &e.error),
        }
    }
    ScanAuditor::log_batch(&report);

    Ok(Json(report))
}
