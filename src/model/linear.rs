use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{reconcile_width, Regressor};
use crate::errors::{ForecastError, ForecastResult};

/// Coefficients for a linear regressor, as exported by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearWeights {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Linear model: `intercept + sum(coefficient_i * feature_i)`
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: LinearWeights,
}

impl LinearModel {
    pub fn new(weights: LinearWeights) -> ForecastResult<Self> {
        if weights.coefficients.is_empty() {
            return Err(ForecastError::config("linear model has no coefficients"));
        }
        if !weights.intercept.is_finite() || weights.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::config("linear model weights must be finite"));
        }
        Ok(Self { weights })
    }

    pub fn from_bytes(
        path: &Path,
        bytes: &[u8],
        n_features: Option<usize>,
    ) -> ForecastResult<Self> {
        let weights: LinearWeights = serde_json::from_slice(bytes).map_err(|e| {
            ForecastError::model_load(path, format!("invalid linear model JSON: {e}"))
        })?;
        let model =
            Self::new(weights).map_err(|e| ForecastError::model_load(path, e.to_string()))?;
        reconcile_width(model.weights.coefficients.len(), n_features)?;
        Ok(model)
    }

    pub fn weights(&self) -> &LinearWeights {
        &self.weights
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.weights.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> ForecastResult<f64> {
        if features.len() != self.weights.coefficients.len() {
            return Err(ForecastError::inference(format!(
                "expected {} features, got {}",
                self.weights.coefficients.len(),
                features.len()
            )));
        }

        Ok(self.weights.intercept
            + features
                .iter()
                .zip(self.weights.coefficients.iter())
                .map(|(f, w)| f * w)
                .sum::<f64>())
    }
}
