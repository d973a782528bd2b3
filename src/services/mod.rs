// Services module for PhishShield
// URL classification pipeline, leaf components first

pub mod classification;
pub mod classifier;
pub mod decision;
pub mod feature_extractor;
pub mod model_store;
pub mod scaler;
pub mod schema;
pub mod trusted_domains;

// Re-export commonly used services
pub use classification::ClassificationEngine;
pub use classifier::{
    ClassifierAdapter, ModelArtifact, ProbabilisticClassifier, RawScore, ScoringError,
};
pub use decision::{Decision, DecisionPolicy};
pub use feature_extractor::{
    extract, extract_detailed, Extraction, FeatureValue, FeatureVector, FEATURE_COUNT,
    FEATURE_LAYOUT,
};
pub use model_store::{LoadedModel, ModelLoadError, ModelMetadata, ModelStore};
pub use scaler::StandardScaler;
pub use schema::{ModelSchema, SchemaMismatchError, SchemaReport};
pub use trusted_domains::{TrustedDomainError, TrustedDomainSet};
