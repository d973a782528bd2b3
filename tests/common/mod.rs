// Common test utilities and helper structs
// Shared across all test files to avoid duplication
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use phishshield_core::{
    app::AppState,
    app_config::{AppConfig, Environment},
    app_router,
    config::PolicyConfig,
    services::{ClassificationEngine, ModelStore, TrustedDomainSet},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tower::util::ServiceExt;

/// Directory holding the fixture model artifacts
pub fn fixture_model_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/model")
}

/// Fixture model whose feature names disagree with the extractor
pub fn mismatched_model_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/model_mismatch")
}

pub fn trusted_domains_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/trusted_domains.json")
}

/// Engine over the fixture model and the bundled trusted domains
pub fn fixture_engine() -> ClassificationEngine {
    let model = ModelStore::new(fixture_model_dir())
        .load()
        .expect("fixture model should load");
    let trusted = TrustedDomainSet::load(trusted_domains_path())
        .expect("bundled trusted domains should load");

    ClassificationEngine::new(Some(model), trusted, PolicyConfig::default())
}

pub fn degraded_engine() -> ClassificationEngine {
    ClassificationEngine::degraded(TrustedDomainSet::builtin(), PolicyConfig::default())
}

/// Configuration built in memory, independent of the process environment
pub fn test_config(model_dir: &Path) -> AppConfig {
    AppConfig {
        bind_address: "127.0.0.1:0".to_string(),
        port: 0,
        environment: Environment::Test,
        rust_log: "debug".to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        model_dir: model_dir.display().to_string(),
        trusted_domains_path: trusted_domains_path().display().to_string(),
        batch_parallelism: 1,
        policy: PolicyConfig::default(),
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
}

impl TestApp {
    pub fn new(engine: ClassificationEngine) -> Self {
        let state = AppState::new(engine, test_config(&fixture_model_dir()));
        Self {
            app: app_router(state),
        }
    }

    /// Send a POST request
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    /// Send a GET request
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    /// Send an OPTIONS request
    pub fn options(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "OPTIONS", uri)
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    body: Body,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        Self {
            app,
            method: method.to_string(),
            uri: uri.to_string(),
            headers: Vec::new(),
            body: Body::empty(),
        }
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        let body_bytes = serde_json::to_vec(body).unwrap();
        self.body = Body::from(body_bytes);
        self.header("content-type", "application/json")
    }

    /// Raw JSON text, for payloads a typed body cannot express
    pub fn raw_json(mut self, body: &str) -> Self {
        self.body = Body::from(body.to_string());
        self.header("content-type", "application/json")
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method.as_str()).uri(&self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(self.body).unwrap();

        let response = self.app.app.clone().oneshot(request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Get response body as text
    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}
