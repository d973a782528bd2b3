// Classifier adapter
// Schema projection, standardization and probabilistic inference for one feature vector

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::feature_extractor::FeatureVector;
use super::scaler::StandardScaler;
use super::schema::ModelSchema;

/// Probability at or above which the model's own hard label is phishing
pub const RAW_LABEL_CUTOFF: f64 = 0.5;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Malformed scaler state: {0}")]
    MalformedScaler(String),

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Classifier returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Inference failed: {0}")]
    Inference(String),
}

// =============================================================================
// CLASSIFIER TRAIT
// =============================================================================

/// Binary classifier over standardized feature arrays.
/// Class 1 is phishing.
pub trait ProbabilisticClassifier: Send + Sync {
    fn model_type(&self) -> &'static str;

    /// Input width the model was trained on, when known
    fn n_features(&self) -> Option<usize>;

    /// P(phishing) for one sample
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoringError>;

    /// Hard label for one sample; a tie at the cutoff is legitimate
    fn predict(&self, x: &[f64]) -> Result<bool, ScoringError> {
        Ok(self.predict_proba(x)? > RAW_LABEL_CUTOFF)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

// =============================================================================
// MODEL ARTIFACTS
// =============================================================================

/// Serialized model, tagged by `"type"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoostedTrees(TreeEnsemble),
    LogisticRegression(LogisticModel),
}

impl ModelArtifact {
    /// Structural checks run once at load
    pub fn validate(&self) -> Result<(), ScoringError> {
        match self {
            Self::GradientBoostedTrees(ensemble) => ensemble.validate(),
            Self::LogisticRegression(model) => model.validate(),
        }
    }
}

impl ProbabilisticClassifier for ModelArtifact {
    fn model_type(&self) -> &'static str {
        match self {
            Self::GradientBoostedTrees(_) => "gradient_boosted_trees",
            Self::LogisticRegression(_) => "logistic_regression",
        }
    }

    fn n_features(&self) -> Option<usize> {
        match self {
            Self::GradientBoostedTrees(ensemble) => ensemble.n_features,
            Self::LogisticRegression(model) => Some(model.coefficients.len()),
        }
    }

    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoringError> {
        match self {
            Self::GradientBoostedTrees(ensemble) => ensemble.predict_proba(x),
            Self::LogisticRegression(model) => model.predict_proba(x),
        }
    }
}

fn default_base_score() -> f64 {
    0.5
}

/// Additive ensemble of regression trees with a logistic link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    #[serde(default)]
    pub n_features: Option<usize>,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Node 0 is the root. Children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn validate(&self, index: usize, n_features: Option<usize>) -> Result<(), ScoringError> {
        if self.nodes.is_empty() {
            return Err(ScoringError::InvalidModel(format!("tree {} has no nodes", index)));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(ScoringError::InvalidModel(format!(
                        "tree {} node {} has a non-finite leaf",
                        index, i
                    )));
                },
                TreeNode::Leaf { .. } => {},
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if threshold.is_nan() {
                        return Err(ScoringError::InvalidModel(format!(
                            "tree {} node {} has a NaN threshold",
                            index, i
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ScoringError::InvalidModel(format!(
                                "tree {} node {} points at invalid child {}",
                                index, i, child
                            )));
                        }
                    }
                    if let Some(n) = n_features {
                        if *feature >= n {
                            return Err(ScoringError::InvalidModel(format!(
                                "tree {} node {} splits on feature {} of {}",
                                index, i, feature, n
                            )));
                        }
                    }
                },
            }
        }

        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64, ScoringError> {
        let mut index = 0;
        loop {
            let node = self.nodes.get(index).ok_or_else(|| {
                ScoringError::InvalidModel(format!("node {} does not exist", index))
            })?;

            match node {
                TreeNode::Leaf { leaf } => return Ok(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or(ScoringError::DimensionMismatch {
                        expected: feature + 1,
                        actual: x.len(),
                    })?;
                    let next = if *value < *threshold { *left } else { *right };
                    if next <= index {
                        return Err(ScoringError::InvalidModel(format!(
                            "node {} loops back to {}",
                            index, next
                        )));
                    }
                    index = next;
                },
            }
        }
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ScoringError> {
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return Err(ScoringError::InvalidModel(format!(
                "base_score must lie strictly between 0 and 1 ({})",
                self.base_score
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }

        Ok(())
    }

    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoringError> {
        let mut margin = logit(self.base_score);
        for tree in &self.trees {
            margin += tree.evaluate(x)?;
        }
        Ok(sigmoid(margin))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn validate(&self) -> Result<(), ScoringError> {
        if self.coefficients.is_empty() {
            return Err(ScoringError::InvalidModel("no coefficients".to_string()));
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ScoringError::InvalidModel(format!(
                "coefficient {} is not finite",
                i
            )));
        }
        if !self.intercept.is_finite() {
            return Err(ScoringError::InvalidModel("intercept is not finite".to_string()));
        }
        Ok(())
    }

    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoringError> {
        if x.len() != self.coefficients.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: x.len(),
            });
        }

        let z: f64 = self
            .coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept;

        Ok(sigmoid(z))
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

/// Undecided classifier output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawScore {
    pub is_phishing: bool,
    pub prob_legit: f64,
    pub prob_phish: f64,
}

/// Fitted scaler plus classifier, fed in model schema order
#[derive(Clone)]
pub struct ClassifierAdapter {
    schema: ModelSchema,
    scaler: StandardScaler,
    classifier: Arc<dyn ProbabilisticClassifier>,
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("schema", &self.schema)
            .field("model_type", &self.classifier.model_type())
            .finish()
    }
}

impl ClassifierAdapter {
    pub fn new(
        schema: ModelSchema,
        scaler: StandardScaler,
        classifier: Arc<dyn ProbabilisticClassifier>,
    ) -> Self {
        Self {
            schema,
            scaler,
            classifier,
        }
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn model_type(&self) -> &'static str {
        self.classifier.model_type()
    }

    /// Project a feature vector through the schema, then score it
    pub fn score(&self, features: &FeatureVector) -> Result<RawScore, ScoringError> {
        let x = features.project(self.schema.names());
        self.score_array(&x)
    }

    /// Score an array already laid out in schema order
    pub fn score_array(&self, x: &[f64]) -> Result<RawScore, ScoringError> {
        let scaled = self.scaler.transform(x)?;

        if let Some(expected) = self.classifier.n_features() {
            if expected != scaled.len() {
                return Err(ScoringError::DimensionMismatch {
                    expected,
                    actual: scaled.len(),
                });
            }
        }

        let prob_phish = self.classifier.predict_proba(&scaled)?;
        if !(0.0..=1.0).contains(&prob_phish) {
            return Err(ScoringError::InvalidProbability(prob_phish));
        }

        let is_phishing = self.classifier.predict(&scaled)?;

        Ok(RawScore {
            is_phishing,
            prob_legit: 1.0 - prob_phish,
            prob_phish,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { leaf: left },
                TreeNode::Leaf { leaf: right },
            ],
        }
    }

    fn adapter(model: ModelArtifact, n: usize) -> ClassifierAdapter {
        let names: Vec<String> = (0..n).map(|i| format!("f{}", i)).collect();
        ClassifierAdapter::new(
            ModelSchema::new(names),
            StandardScaler::identity(n),
            Arc::new(model),
        )
    }

    struct FixedProbability(f64);

    impl ProbabilisticClassifier for FixedProbability {
        fn model_type(&self) -> &'static str {
            "fixed"
        }
        fn n_features(&self) -> Option<usize> {
            None
        }
        fn predict_proba(&self, _x: &[f64]) -> Result<f64, ScoringError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_logistic_regression() {
        let model = ModelArtifact::LogisticRegression(LogisticModel {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        });
        let lr = adapter(model, 2);

        let score = lr.score_array(&[2.0, 2.0]).unwrap();
        assert!((score.prob_phish - RAW_LABEL_CUTOFF).abs() < 1e-12);
        assert!(!score.is_phishing);

        let score = lr.score_array(&[2.0, 1.0]).unwrap();
        assert!(score.prob_phish > RAW_LABEL_CUTOFF);
        assert!(score.is_phishing);
    }

    #[test]
    fn test_default_predict_tie_is_legitimate() {
        let at_cutoff = FixedProbability(RAW_LABEL_CUTOFF);
        assert!(!at_cutoff.predict(&[]).unwrap());

        let above = FixedProbability(0.5000001);
        assert!(above.predict(&[]).unwrap());
    }

    #[test]
    fn test_tree_ensemble_routes_left_below_threshold() {
        let model = ModelArtifact::GradientBoostedTrees(TreeEnsemble {
            base_score: 0.5,
            n_features: Some(2),
            trees: vec![stump(0, 10.0, -2.0, 2.0), stump(1, 0.5, 0.0, 1.0)],
        });
        model.validate().unwrap();
        let adapter = adapter(model, 2);

        let low = adapter.score_array(&[3.0, 0.0]).unwrap();
        assert!(!low.is_phishing);
        assert!((low.prob_phish - sigmoid(-2.0)).abs() < 1e-12);

        let high = adapter.score_array(&[10.0, 1.0]).unwrap();
        assert!(high.is_phishing);
        assert!((high.prob_phish - sigmoid(3.0)).abs() < 1e-12);
        assert!((high.prob_legit + high.prob_phish - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_artifact_json_shape() {
        let json = r#"{
            "type": "gradient_boosted_trees",
            "base_score": 0.5,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"leaf": -0.4},
                {"leaf": 0.4}
            ]}]
        }"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(model.model_type(), "gradient_boosted_trees");
        assert_eq!(model.n_features(), None);
        model.validate().unwrap();
    }

    #[test]
    fn test_invalid_child_rejected() {
        let model = ModelArtifact::GradientBoostedTrees(TreeEnsemble {
            base_score: 0.5,
            n_features: None,
            trees: vec![Tree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 5,
                    },
                    TreeNode::Leaf { leaf: 1.0 },
                ],
            }],
        });
        assert!(matches!(model.validate(), Err(ScoringError::InvalidModel(_))));
    }

    #[test]
    fn test_bad_base_score_rejected() {
        let model = ModelArtifact::GradientBoostedTrees(TreeEnsemble {
            base_score: 1.0,
            n_features: None,
            trees: vec![],
        });
        assert!(matches!(model.validate(), Err(ScoringError::InvalidModel(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = ModelArtifact::LogisticRegression(LogisticModel {
            coefficients: vec![1.0, 1.0, 1.0],
            intercept: 0.0,
        });
        let adapter = ClassifierAdapter::new(
            ModelSchema::new(["a", "b"]),
            StandardScaler::identity(2),
            Arc::new(model),
        );
        assert_eq!(
            adapter.score_array(&[1.0, 1.0]),
            Err(ScoringError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let adapter = ClassifierAdapter::new(
            ModelSchema::new(["a"]),
            StandardScaler::identity(1),
            Arc::new(FixedProbability(f64::NAN)),
        );
        assert!(matches!(
            adapter.score_array(&[0.0]),
            Err(ScoringError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_score_projects_missing_names_as_sentinel() {
        let model = ModelArtifact::LogisticRegression(LogisticModel {
            coefficients: vec![0.0, 1.0],
            intercept: 0.0,
        });
        let adapter = ClassifierAdapter::new(
            ModelSchema::new(["url_length", "not_extracted"]),
            StandardScaler::identity(2),
            Arc::new(model),
        );
        let mut features = FeatureVector::new();
        features.insert("url_length", 30usize);

        let score = adapter.score(&features).unwrap();
        assert!((score.prob_phish - sigmoid(-1.0)).abs() < 1e-12);
    }
}
