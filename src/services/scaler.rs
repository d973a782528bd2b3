// Standard scaler fitted at training time
// transform(x)[i] = (x[i] - mean[i]) / scale[i]

use serde::{Deserialize, Serialize};

use super::classifier::ScoringError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Pass-through scaler for `n` features
    pub fn identity(n: usize) -> Self {
        Self {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Check the fitted state is usable
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.mean.len() != self.scale.len() {
            return Err(ScoringError::MalformedScaler(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }

        if let Some((i, m)) = self.mean.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(ScoringError::MalformedScaler(format!(
                "mean[{}] is not finite ({})",
                i, m
            )));
        }

        if let Some((i, s)) = self
            .scale
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s == 0.0)
        {
            return Err(ScoringError::MalformedScaler(format!(
                "scale[{}] must be finite and non-zero ({})",
                i, s
            )));
        }

        Ok(())
    }

    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>, ScoringError> {
        self.validate()?;

        if x.len() != self.n_features() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.len(),
            });
        }

        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }
}
