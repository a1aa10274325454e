use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ModelError;

/// Frozen prediction function. Built once at startup and shared read-only.
pub trait Scorer: Send + Sync + 'static {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
}

/// `intercept + weights · features`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Load a model saved as `{"weights": [...], "intercept": ...}`
    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        let json_content = fs::read_to_string(path)
            .await
            .map_err(|source| ModelError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&json_content).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn dimension(&self) -> usize {
        self.weights.len()
    }
}

impl Scorer for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::Dimension {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        Ok(self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}
