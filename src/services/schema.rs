// Model schema compatibility check
// Compares the feature names a model was fit against with the live extractor layout

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::feature_extractor::FEATURE_LAYOUT;

// =============================================================================
// MODEL SCHEMA
// =============================================================================

/// Ordered feature names a loaded model/scaler pair was fit against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSchema {
    names: Vec<String>,
}

impl ModelSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema identical to the current extractor layout
    pub fn from_layout() -> Self {
        Self::new(FEATURE_LAYOUT.iter().copied())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Model feature mismatch - retrain model (model expects {expected} features, extractor produces {actual})")]
pub struct SchemaMismatchError {
    pub expected: usize,
    pub actual: usize,
    pub missing_in_extractor: Vec<String>,
    pub extra_in_extractor: Vec<String>,
}

/// Name-level comparison between model schema and extractor output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReport {
    pub expected: usize,
    pub actual: usize,
    pub missing_in_extractor: Vec<String>,
    pub extra_in_extractor: Vec<String>,
    pub order_matches: bool,
}

impl SchemaReport {
    pub fn compare<S: AsRef<str>>(model: &ModelSchema, extractor_names: &[S]) -> Self {
        let missing_in_extractor = model
            .names()
            .iter()
            .filter(|name| !extractor_names.iter().any(|n| n.as_ref() == name.as_str()))
            .cloned()
            .collect();

        let extra_in_extractor = extractor_names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| model.position(name).is_none())
            .map(str::to_string)
            .collect();

        let order_matches = model.len() == extractor_names.len()
            && model
                .names()
                .iter()
                .zip(extractor_names)
                .all(|(a, b)| a == b.as_ref());

        Self {
            expected: model.len(),
            actual: extractor_names.len(),
            missing_in_extractor,
            extra_in_extractor,
            order_matches,
        }
    }

    /// Cardinality agrees; this is the only condition that gates scoring
    pub fn is_compatible(&self) -> bool {
        self.expected == self.actual
    }

    /// Same count but different names or order
    pub fn has_name_drift(&self) -> bool {
        self.is_compatible() && !self.order_matches
    }
}

/// Gate scoring on the model schema and the extractor agreeing in cardinality
pub fn validate<S: AsRef<str>>(
    model: &ModelSchema,
    extractor_names: &[S],
) -> Result<SchemaReport, SchemaMismatchError> {
    let report = SchemaReport::compare(model, extractor_names);

    if !report.is_compatible() {
        return Err(SchemaMismatchError {
            expected: report.expected,
            actual: report.actual,
            missing_in_extractor: report.missing_in_extractor,
            extra_in_extractor: report.extra_in_extractor,
        });
    }

    Ok(report)
}
