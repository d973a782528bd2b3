// Model store
// Loads the classifier, scaler and feature schema from MODEL_DIR once at startup

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::classifier::{ClassifierAdapter, ModelArtifact, ProbabilisticClassifier};
use super::feature_extractor::FEATURE_LAYOUT;
use super::scaler::StandardScaler;
use super::schema::{self, ModelSchema, SchemaMismatchError, SchemaReport};

pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "phishing_model.json";

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: String, reason: String },
}

// =============================================================================
// LOADED MODEL
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub model_dir: String,
    pub model_type: String,
    pub feature_count: usize,
    /// SHA-256 of each artifact file, keyed by file name
    pub checksums: BTreeMap<String, String>,
    pub loaded_at: DateTime<Utc>,
}

/// Everything the engine needs from the model directory
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub adapter: ClassifierAdapter,
    pub metadata: ModelMetadata,
    /// Schema check against the live extractor, computed once at load
    pub schema_check: Result<SchemaReport, SchemaMismatchError>,
}

impl LoadedModel {
    /// Assemble from in-memory parts, e.g. a mock classifier in tests
    pub fn from_parts(
        schema: ModelSchema,
        scaler: StandardScaler,
        classifier: Arc<dyn ProbabilisticClassifier>,
    ) -> Self {
        let schema_check = schema::validate(&schema, FEATURE_LAYOUT);
        let metadata = ModelMetadata {
            model_dir: "<memory>".to_string(),
            model_type: classifier.model_type().to_string(),
            feature_count: schema.len(),
            checksums: BTreeMap::new(),
            loaded_at: Utc::now(),
        };

        Self {
            adapter: ClassifierAdapter::new(schema, scaler, classifier),
            metadata,
            schema_check,
        }
    }
}

// =============================================================================
// MODEL STORE
// =============================================================================

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read and check all three artifacts
    pub fn load(&self) -> Result<LoadedModel, ModelLoadError> {
        info!("Loading model artifacts from {}", self.dir.display());

        let mut checksums = BTreeMap::new();

        let schema: ModelSchema = self.read_json(FEATURE_NAMES_FILE, &mut checksums)?;
        let scaler: StandardScaler = self.read_json(SCALER_FILE, &mut checksums)?;
        let model: ModelArtifact = self.read_json(MODEL_FILE, &mut checksums)?;

        if schema.is_empty() {
            return Err(self.invalid(FEATURE_NAMES_FILE, "feature list is empty".to_string()));
        }

        scaler
            .validate()
            .map_err(|e| self.invalid(SCALER_FILE, e.to_string()))?;
        if scaler.n_features() != schema.len() {
            return Err(self.invalid(
                SCALER_FILE,
                format!(
                    "scaler has {} features but the schema lists {}",
                    scaler.n_features(),
                    schema.len()
                ),
            ));
        }

        model
            .validate()
            .map_err(|e| self.invalid(MODEL_FILE, e.to_string()))?;
        if let Some(n) = model.n_features() {
            if n != schema.len() {
                return Err(self.invalid(
                    MODEL_FILE,
                    format!("model takes {} features but the schema lists {}", n, schema.len()),
                ));
            }
        }

        let schema_check = schema::validate(&schema, FEATURE_LAYOUT);
        match &schema_check {
            Ok(report) if report.has_name_drift() => warn!(
                "Model feature names drift from the extractor (missing: {:?}, extra: {:?}, order matches: {})",
                report.missing_in_extractor, report.extra_in_extractor, report.order_matches
            ),
            Ok(_) => debug!("Model schema matches extractor layout"),
            Err(e) => warn!("{}. Scoring will be refused until the model is redeployed", e),
        }

        let metadata = ModelMetadata {
            model_dir: self.dir.display().to_string(),
            model_type: model.model_type().to_string(),
            feature_count: schema.len(),
            checksums,
            loaded_at: Utc::now(),
        };

        info!(
            "Model loaded: {} over {} features",
            metadata.model_type, metadata.feature_count
        );

        Ok(LoadedModel {
            adapter: ClassifierAdapter::new(schema, scaler, Arc::new(model)),
            metadata,
            schema_check,
        })
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        file: &str,
        checksums: &mut BTreeMap<String, String>,
    ) -> Result<T, ModelLoadError> {
        let path = self.dir.join(file);
        let display = path.display().to_string();

        let bytes = std::fs::read(&path).map_err(|source| ModelLoadError::Io {
            path: display.clone(),
            source,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        checksums.insert(file.to_string(), format!("{:x}", hasher.finalize()));

        serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Parse {
            path: display,
            source,
        })
    }

    fn invalid(&self, file: &str, reason: String) -> ModelLoadError {
        ModelLoadError::InvalidArtifact {
            path: self.dir.join(file).display().to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/model")
    }

    #[test]
    fn test_load_fixture_model() {
        let loaded = ModelStore::new(fixture_dir()).load().unwrap();

        assert_eq!(loaded.metadata.feature_count, FEATURE_LAYOUT.len());
        assert_eq!(loaded.metadata.model_type, "gradient_boosted_trees");
        assert_eq!(loaded.metadata.checksums.len(), 3);
        assert!(loaded.metadata.checksums[MODEL_FILE]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
        assert_eq!(loaded.metadata.checksums[MODEL_FILE].len(), 64);
        assert!(loaded.schema_check.is_ok());
    }

    #[test]
    fn test_missing_directory() {
        let err = ModelStore::new("/nonexistent/model").load().unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }

    #[test]
    fn test_from_parts_records_mismatch() {
        let loaded = LoadedModel::from_parts(
            ModelSchema::new(["a", "b"]),
            StandardScaler::identity(2),
            Arc::new(ModelArtifact::LogisticRegression(
                crate::services::classifier::LogisticModel {
                    coefficients: vec![1.0, 1.0],
                    intercept: 0.0,
                },
            )),
        );
        let err = loaded.schema_check.unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.actual, FEATURE_LAYOUT.len());
    }
}
