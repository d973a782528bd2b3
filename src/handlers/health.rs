use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::app::AppState;

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "PhishShield API is running" }))
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.engine.health_check();
    let timestamp = chrono::Utc::now().to_rfc3339();

    if !health.model_loaded {
        error!("Health check failed - model not loaded");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "reason": "Model not loaded",
                "model_loaded": false,
                "timestamp": timestamp,
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "phishshield-core",
            "timestamp": timestamp,
            "model_loaded": true,
            "model_type": health.model_type,
            "feature_count": health.feature_count,
            "schema_compatible": health.schema_compatible,
            "trusted_domains": {
                "count": health.trusted_domains,
                "version": health.trusted_domains_version,
            },
        })),
    )
}
