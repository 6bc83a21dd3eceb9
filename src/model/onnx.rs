//! ONNX regressors executed with tract
//!
//! The graph is pinned to a single-row `f32` input of shape `[1, n]` and
//! optimized once at load time. The first element of the first output is the
//! prediction.

use std::path::Path;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::infer::Factoid;
use tract_onnx::tract_hir::internal::DimLike;

use super::{reconcile_width, Regressor};
use crate::errors::{ForecastError, ForecastResult};

type OnnxPlan = TypedRunnableModel<TypedModel>;

pub struct OnnxModel {
    plan: OnnxPlan,
    n_features: usize,
}

impl OnnxModel {
    pub fn from_bytes(
        path: &Path,
        bytes: &[u8],
        n_features: Option<usize>,
    ) -> ForecastResult<Self> {
        let load_err = |e: TractError| ForecastError::model_load(path, e.to_string());

        let mut reader = bytes;
        let model = tract_onnx::onnx().model_for_read(&mut reader).map_err(load_err)?;

        let n_features = match (declared_width(&model), n_features) {
            (Some(declared), configured) => reconcile_width(declared, configured)?,
            (None, Some(configured)) => configured,
            (None, None) => {
                return Err(ForecastError::model_load(
                    path,
                    "input width is dynamic, set model.n_features",
                ))
            }
        };

        let plan = model
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(load_err)?;

        Ok(Self { plan, n_features })
    }
}

/// Concrete width of the last input axis, if the graph declares one.
/// The batch axis is usually unset or symbolic and is ignored.
fn declared_width(model: &InferenceModel) -> Option<usize> {
    let fact = model.input_fact(0).ok()?;
    fact.shape.dims().last()?.concretize()?.to_usize().ok()
}

impl Regressor for OnnxModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> ForecastResult<f64> {
        let infer_err = |e: TractError| ForecastError::inference(e.to_string());

        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), row)
            .map_err(|e| ForecastError::inference(e.to_string()))?
            .into();

        let outputs = self.plan.run(tvec!(input.into())).map_err(infer_err)?;
        let first = outputs
            .first()
            .ok_or_else(|| ForecastError::inference("model produced no outputs"))?;
        let values = first.cast_to::<f64>().map_err(infer_err)?;
        let values = values.as_slice::<f64>().map_err(infer_err)?;

        values
            .first()
            .copied()
            .ok_or_else(|| ForecastError::inference("model produced an empty output tensor"))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{matmul_model, BatchAxis};
    use super::*;

    const WEIGHTS: [f32; 4] = [1.0, 2.0, 3.0, 4.0];

    #[test]
    fn garbage_bytes_fail_to_load() {
        let bytes = b"\x00\x01not protobuf";
        let result = OnnxModel::from_bytes(Path::new("bad.onnx"), bytes, Some(4));
        assert!(matches!(result, Err(ForecastError::ModelLoad { .. })));
    }

    #[test]
    fn named_batch_axis_reads_width_from_graph() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Named("N"), Some(4));
        let model = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, None).unwrap();
        assert_eq!(model.n_features(), 4);

        let y = model.predict(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!((y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn unset_batch_axis_still_reads_width_from_graph() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Unset, Some(4));
        let model = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, None).unwrap();
        assert_eq!(model.n_features(), 4);

        let y = model.predict(&[0.5, 0.0, 1.0, -1.0]).unwrap();
        assert!((y - -0.5).abs() < 1e-5);
    }

    #[test]
    fn unknown_symbol_batch_axis_reads_width_from_graph() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Named("?"), Some(4));
        let model = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, None).unwrap();
        assert_eq!(model.n_features(), 4);
    }

    #[test]
    fn fixed_batch_axis_loads() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Fixed(1), Some(4));
        let model = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, Some(4)).unwrap();
        let y = model.predict(&[2.0, 0.0, 0.0, 0.0]).unwrap();
        assert!((y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn configured_width_disagreeing_with_graph_fails() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Named("N"), Some(4));
        let result = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, Some(3));
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch {
                model: 4,
                configured: 3
            })
        ));
    }

    #[test]
    fn dynamic_width_without_config_fails() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Unset, None);
        let err = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, None)
            .err()
            .expect("dynamic width needs model.n_features");
        assert!(err.to_string().contains("set model.n_features"));
    }

    #[test]
    fn dynamic_width_uses_configured_value() {
        let bytes = matmul_model(&WEIGHTS, BatchAxis::Unset, None);
        let model = OnnxModel::from_bytes(Path::new("m.onnx"), &bytes, Some(4)).unwrap();
        assert_eq!(model.n_features(), 4);
        let y = model.predict(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        assert!((y - 5.0).abs() < 1e-5);
    }
}
