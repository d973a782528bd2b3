// Classification engine
// Immutable context built once at startup and shared by every request

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::classifier::ProbabilisticClassifier;
use super::decision::DecisionPolicy;
use super::feature_extractor::{extract_detailed, request_domain};
use super::model_store::{LoadedModel, ModelMetadata, ModelStore};
use super::scaler::StandardScaler;
use super::schema::ModelSchema;
use super::trusted_domains::TrustedDomainSet;
use crate::app_config::AppConfig;
use crate::config::PolicyConfig;
use crate::models::{
    BatchItemResult, BatchReport, ClassificationResult, HealthStatus, ItemError, ResultFeatures,
    TRUSTED_DOMAIN_REASON,
};
use crate::utils::classification_errors::ClassificationError;

pub struct ClassificationEngine {
    model: Option<LoadedModel>,
    trusted: TrustedDomainSet,
    decision: DecisionPolicy,
    policy: PolicyConfig,
    batch_parallelism: usize,
}

impl ClassificationEngine {
    pub fn new(model: Option<LoadedModel>, trusted: TrustedDomainSet, policy: PolicyConfig) -> Self {
        Self {
            model,
            trusted,
            decision: DecisionPolicy::new(policy.phishing_threshold),
            policy,
            batch_parallelism: 1,
        }
    }

    /// Load trusted domains and model artifacts as configured.
    /// A model that fails to load leaves the engine degraded, not dead.
    pub fn from_config(config: &AppConfig) -> Self {
        let trusted = TrustedDomainSet::load_or_builtin(&config.trusted_domains_path);

        let model = match ModelStore::new(&config.model_dir).load() {
            Ok(model) => Some(model),
            Err(e) => {
                error!("Failed to load model from {}: {}", config.model_dir, e);
                warn!("Classification engine running without a model; requests will be refused");
                None
            },
        };

        Self::new(model, trusted, config.policy.clone())
            .with_batch_parallelism(config.batch_parallelism)
    }

    /// Engine around an in-memory classifier
    pub fn with_classifier(
        schema: ModelSchema,
        scaler: StandardScaler,
        classifier: Arc<dyn ProbabilisticClassifier>,
        trusted: TrustedDomainSet,
        policy: PolicyConfig,
    ) -> Self {
        Self::new(
            Some(LoadedModel::from_parts(schema, scaler, classifier)),
            trusted,
            policy,
        )
    }

    /// Engine with no model, as after a failed startup load
    pub fn degraded(trusted: TrustedDomainSet, policy: PolicyConfig) -> Self {
        Self::new(None, trusted, policy)
    }

    pub fn with_batch_parallelism(mut self, workers: usize) -> Self {
        self.batch_parallelism = workers.max(1);
        self
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_metadata(&self) -> Option<&ModelMetadata> {
        self.model.as_ref().map(|m| &m.metadata)
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn trusted_domains(&self) -> &TrustedDomainSet {
        &self.trusted
    }

    // =========================================================================
    // SINGLE URL
    // =========================================================================

    pub fn classify_one(&self, url: &str) -> Result<ClassificationResult, ClassificationError> {
        let model = self.model.as_ref().ok_or(ClassificationError::ModelUnavailable)?;

        let domain = request_domain(url);
        if self.trusted.is_trusted(&domain) {
            info!("URL from trusted domain: {}", domain);
            return Ok(ClassificationResult {
                is_phishing: false,
                confidence: self.policy.trusted_domain_confidence,
                features: ResultFeatures::trusted(domain),
                reason: Some(TRUSTED_DOMAIN_REASON.to_string()),
            });
        }

        let extraction = extract_detailed(url);
        if extraction.is_fallback() {
            debug!("Using fallback features for {}", url);
        }
        let features = extraction.vector().conform_to(model.adapter.schema().names());

        if let Err(e) = &model.schema_check {
            error!("Feature mismatch: stored={}, current={}", e.expected, e.actual);
            return Err(ClassificationError::SchemaMismatch(e.clone()));
        }

        let score = model.adapter.score(&features).map_err(|e| {
            error!("Error making prediction for {}: {}", url, e);
            ClassificationError::from(e)
        })?;

        let decision = self.decision.decide_score(&score);
        debug!(
            "Prediction probabilities: legitimate={:.3}, phishing={:.3}",
            score.prob_legit, score.prob_phish
        );
        debug!(
            "Final prediction: is_phishing={}, confidence={:.3}",
            decision.is_phishing, decision.confidence
        );

        Ok(ClassificationResult {
            is_phishing: decision.is_phishing,
            confidence: decision.confidence,
            features: ResultFeatures::Lexical(features),
            reason: None,
        })
    }

    // =========================================================================
    // BATCH
    // =========================================================================

    /// Classify a batch under the configured size cap
    pub fn classify_many<S: AsRef<str> + Sync>(
        &self,
        urls: &[S],
    ) -> Result<BatchReport, ClassificationError> {
        self.classify_many_with_limit(urls, self.policy.max_batch_items)
    }

    /// Classify a batch, isolating per-URL failures.
    /// Oversized batches are rejected before any URL is looked at.
    pub fn classify_many_with_limit<S: AsRef<str> + Sync>(
        &self,
        urls: &[S],
        max_items: usize,
    ) -> Result<BatchReport, ClassificationError> {
        if urls.len() > max_items {
            return Err(ClassificationError::BatchTooLarge {
                max: max_items,
                actual: urls.len(),
            });
        }

        info!("Processing batch of {} URLs", urls.len());

        let results = if self.batch_parallelism > 1 && urls.len() > 1 {
            self.classify_parallel(urls)
        } else {
            urls.iter().map(|url| self.classify_item(url.as_ref())).collect()
        };

        let report = BatchReport::new(results);
        info!(
            "Batch complete: {} of {} URLs classified",
            report.successful, report.total
        );

        Ok(report)
    }

    /// One batch entry; errors and panics stay local to this URL
    fn classify_item(&self, url: &str) -> BatchItemResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.classify_one(url)));

        let failure = match outcome {
            Ok(Ok(result)) => {
                return BatchItemResult::Classified {
                    url: url.to_string(),
                    result,
                }
            },
            Ok(Err(e)) => {
                warn!("Error processing URL in batch: {}: {}", url, e);
                e
            },
            Err(_) => {
                error!("Classifier panicked while processing URL in batch: {}", url);
                ClassificationError::Internal("classifier panicked".to_string())
            },
        };

        BatchItemResult::Failed(ItemError {
            url: url.to_string(),
            error: failure.to_string(),
        })
    }

    /// Contiguous chunks on scoped threads; output keeps input order
    fn classify_parallel<S: AsRef<str> + Sync>(&self, urls: &[S]) -> Vec<BatchItemResult> {
        let chunk_size = urls.len().div_ceil(self.batch_parallelism);

        std::thread::scope(|scope| {
            let workers: Vec<_> = urls
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|url| self.classify_item(url.as_ref()))
                            .collect::<Vec<_>>()
                    });
                    (chunk, handle)
                })
                .collect();

            workers
                .into_iter()
                .flat_map(|(chunk, handle)| match handle.join() {
                    Ok(items) => items,
                    Err(_) => {
                        error!("Batch worker panicked; failing {} URLs", chunk.len());
                        chunk
                            .iter()
                            .map(|url| {
                                BatchItemResult::Failed(ItemError {
                                    url: url.as_ref().to_string(),
                                    error: ClassificationError::Internal(
                                        "batch worker panicked".to_string(),
                                    )
                                    .to_string(),
                                })
                            })
                            .collect()
                    },
                })
                .collect()
        })
    }

    // =========================================================================
    // HEALTH
    // =========================================================================

    pub fn health_check(&self) -> HealthStatus {
        HealthStatus {
            model_loaded: self.is_model_loaded(),
            model_type: self.model.as_ref().map(|m| m.metadata.model_type.clone()),
            feature_count: self.model.as_ref().map(|m| m.metadata.feature_count),
            schema_compatible: self
                .model
                .as_ref()
                .map(|m| m.schema_check.is_ok())
                .unwrap_or(false),
            trusted_domains: self.trusted.len(),
            trusted_domains_version: self.trusted.version().to_string(),
        }
    }
}
