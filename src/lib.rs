// Library exports for PhishShield
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use config::PolicyConfig;
pub use models::{BatchItemResult, BatchReport, ClassificationResult, HealthStatus, ItemError};
pub use services::{
    ClassificationEngine, FeatureVector, ModelSchema, ProbabilisticClassifier, ScoringError,
    StandardScaler, TrustedDomainSet,
};
pub use utils::ClassificationError;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the shared state: trusted domains and model artifacts are loaded here, once.
/// Model loading failures leave the engine degraded instead of aborting startup.
pub fn initialize_app_state(config: &AppConfig) -> AppState {
    info!("Initializing classification engine...");
    let engine = ClassificationEngine::from_config(config);

    if engine.is_model_loaded() {
        info!("Classification engine ready");
    }

    AppState::new(engine, config.clone())
}

/// Full application router
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .nest("/api", handlers::api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
