//! Prediction service: validates a feature row and runs it through the model.

use std::sync::Arc;

use crate::api_errors::ApiError;
use crate::model::{LoadedModel, ModelInfo, Regressor};

/// Shared, read-only handle to the loaded model. Cheap to clone.
#[derive(Clone)]
pub struct PredictionService {
    model: Arc<dyn Regressor>,
    info: Arc<ModelInfo>,
}

impl PredictionService {
    pub fn new(loaded: LoadedModel) -> Self {
        Self {
            model: loaded.model,
            info: Arc::new(loaded.info),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    /// Reject rows the model cannot score
    pub fn validate(&self, features: &[f64]) -> Result<(), ApiError> {
        if features.is_empty() {
            return Err(ApiError::validation("features must not be empty"));
        }

        let expected = self.model.n_features();
        if features.len() != expected {
            return Err(ApiError::validation(format!(
                "expected {expected} features, got {}",
                features.len()
            )));
        }

        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(ApiError::validation(format!(
                "feature at index {idx} is not a finite number"
            )));
        }

        // Tensor backends compute in f32
        if let Some(idx) = features.iter().position(|v| v.abs() > f64::from(f32::MAX)) {
            return Err(ApiError::validation(format!(
                "feature at index {idx} is outside the representable range"
            )));
        }

        Ok(())
    }

    /// Validate and predict on the calling thread
    pub fn predict_blocking(&self, features: &[f64]) -> Result<f64, ApiError> {
        self.validate(features)?;
        self.infer(features)
    }

    /// Validate and predict, running inference on the blocking pool
    pub async fn predict(&self, features: Vec<f64>) -> Result<f64, ApiError> {
        self.validate(&features)?;

        let service = self.clone();
        tokio::task::spawn_blocking(move || service.infer(&features))
            .await
            .map_err(|e| ApiError::inference(format!("Prediction task failed: {e}")))?
    }

    /// Run an already validated row through the model
    fn infer(&self, features: &[f64]) -> Result<f64, ApiError> {
        let prediction = self.model.predict(features).map_err(ApiError::from)?;

        if !prediction.is_finite() {
            return Err(ApiError::inference(format!(
                "Prediction failed: model returned non-finite value {prediction}"
            )));
        }

        Ok(prediction)
    }
}
