// HTTP handlers for PhishShield

pub mod health;
pub mod predict;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

// Prediction routes, mounted under /api
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/predict", post(predict::predict))
        .route("/predict/bulk", post(predict::predict_bulk))
}
