//! Linear regressor stored as safetensors and evaluated with candle
//!
//! Expects a `weight` tensor of shape `[n]` or `[1, n]` and an optional `bias`
//! of shape `[]` or `[1]`.

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::Linear;
use std::path::Path;

use super::{reconcile_width, Regressor};
use crate::errors::{ForecastError, ForecastResult};

pub const WEIGHT_TENSOR: &str = "weight";
pub const BIAS_TENSOR: &str = "bias";

pub struct SafetensorsLinear {
    layer: Linear,
    n_features: usize,
    device: Device,
}

impl SafetensorsLinear {
    pub fn from_bytes(
        path: &Path,
        bytes: &[u8],
        n_features: Option<usize>,
    ) -> ForecastResult<Self> {
        let device = Device::Cpu;
        let load_err = |e: candle_core::Error| ForecastError::model_load(path, e.to_string());

        let mut tensors = candle_core::safetensors::load_buffer(bytes, &device).map_err(load_err)?;

        let weight = tensors.remove(WEIGHT_TENSOR).ok_or_else(|| {
            ForecastError::model_load(path, format!("missing '{WEIGHT_TENSOR}' tensor"))
        })?;
        let width = match weight.dims() {
            [n] => *n,
            [1, n] => *n,
            dims => {
                return Err(ForecastError::model_load(
                    path,
                    format!("'{WEIGHT_TENSOR}' must have shape [n] or [1, n], got {dims:?}"),
                ))
            }
        };
        if width == 0 {
            return Err(ForecastError::model_load(path, "weight tensor is empty"));
        }
        let weight = weight
            .reshape((1, width))
            .and_then(|w| w.to_dtype(DType::F32))
            .map_err(load_err)?;

        let bias = match tensors.remove(BIAS_TENSOR) {
            Some(bias) if bias.elem_count() == 1 => Some(
                bias.reshape(1usize)
                    .and_then(|b| b.to_dtype(DType::F32))
                    .map_err(load_err)?,
            ),
            Some(bias) => {
                return Err(ForecastError::model_load(
                    path,
                    format!("'{BIAS_TENSOR}' must hold one value, got shape {:?}", bias.dims()),
                ))
            }
            None => None,
        };

        let n_features = reconcile_width(width, n_features)?;

        Ok(Self {
            layer: Linear::new(weight, bias),
            n_features,
            device,
        })
    }
}

impl Regressor for SafetensorsLinear {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> ForecastResult<f64> {
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let infer_err = |e: candle_core::Error| ForecastError::inference(e.to_string());

        let input = Tensor::from_vec(row, (1, features.len()), &self.device).map_err(infer_err)?;
        let output = self
            .layer
            .forward(&input)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(infer_err)?;

        output
            .first()
            .map(|&v| f64::from(v))
            .ok_or_else(|| ForecastError::inference("model produced no output"))
    }
}
