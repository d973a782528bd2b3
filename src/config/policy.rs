// Decision policy configuration
// The three numbers that shape every verdict, kept out of the decision logic

use serde::{Deserialize, Serialize};

use crate::app_config::ConfigError;

/// Minimum phishing probability required to keep a phishing verdict.
/// The legitimate branch has no explicit bar (it wins below this).
pub const DEFAULT_PHISHING_THRESHOLD: f64 = 0.6;

/// Confidence reported when a URL is short-circuited by the trusted set
pub const DEFAULT_TRUSTED_DOMAIN_CONFIDENCE: f64 = 0.99;

/// Maximum number of URLs accepted in one batch
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 100;

/// Policy configuration for the classification engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Phishing verdicts with a lower probability are downgraded to legitimate
    pub phishing_threshold: f64,

    /// Confidence attached to trusted-domain results
    pub trusted_domain_confidence: f64,

    /// Batches larger than this are rejected before any item is processed
    pub max_batch_items: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            phishing_threshold: DEFAULT_PHISHING_THRESHOLD,
            trusted_domain_confidence: DEFAULT_TRUSTED_DOMAIN_CONFIDENCE,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
        }
    }
}

impl PolicyConfig {
    /// Reject values that would make the decision logic meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.phishing_threshold) {
            return Err(ConfigError::InvalidValue(
                "PHISHING_THRESHOLD".to_string(),
                format!("must be within [0, 1], got {}", self.phishing_threshold),
            ));
        }

        if !(0.0..=1.0).contains(&self.trusted_domain_confidence) {
            return Err(ConfigError::InvalidValue(
                "TRUSTED_DOMAIN_CONFIDENCE".to_string(),
                format!(
                    "must be within [0, 1], got {}",
                    self.trusted_domain_confidence
                ),
            ));
        }

        if self.max_batch_items == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_BATCH_ITEMS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
