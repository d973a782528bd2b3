// Asymmetric decision policy
// A phishing verdict needs the model's phishing label AND P(phish) >= threshold.
// Every other outcome is legitimate with P(legit) as confidence.

use serde::Serialize;
use tracing::debug;

use super::classifier::RawScore;
use crate::config::DEFAULT_PHISHING_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub is_phishing: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    phishing_threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PHISHING_THRESHOLD)
    }
}

impl DecisionPolicy {
    pub fn new(phishing_threshold: f64) -> Self {
        Self { phishing_threshold }
    }

    pub fn phishing_threshold(&self) -> f64 {
        self.phishing_threshold
    }

    pub fn decide(&self, raw_label: bool, prob_legit: f64, prob_phish: f64) -> Decision {
        let decision = if raw_label && prob_phish >= self.phishing_threshold {
            Decision {
                is_phishing: true,
                confidence: prob_phish,
            }
        } else {
            Decision {
                is_phishing: false,
                confidence: prob_legit,
            }
        };

        if raw_label && !decision.is_phishing {
            debug!(
                "Phishing label overridden: P(phish)={:.3} below threshold {:.2}",
                prob_phish, self.phishing_threshold
            );
        }

        decision
    }

    pub fn decide_score(&self, score: &RawScore) -> Decision {
        self.decide(score.is_phishing, score.prob_legit, score.prob_phish)
    }
}
