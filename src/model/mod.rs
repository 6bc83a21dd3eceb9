//! Model loading and the `Regressor` seam
//!
//! A model artifact is read once at startup and wrapped behind
//! `Arc<dyn Regressor>`. Backends never mutate during inference, so the handle
//! is shared across request tasks without locking.

pub mod linear;
pub mod onnx;
pub mod safetensors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config_loader::ModelConfig;
use crate::errors::{ForecastError, ForecastResult};

pub use linear::{LinearModel, LinearWeights};
pub use onnx::OnnxModel;
pub use safetensors::SafetensorsLinear;

/// A loaded regression model: one feature row in, one scalar out
pub trait Regressor: Send + Sync {
    /// Number of features a single input row must carry
    fn n_features(&self) -> usize;

    /// Run inference on one row. Callers validate the row length first.
    fn predict(&self, features: &[f64]) -> ForecastResult<f64>;
}

/// Serialized model formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFormat {
    Onnx,
    Safetensors,
    LinearJson,
}

impl ModelFormat {
    /// Infer the format from the artifact's file extension
    pub fn from_path(path: &Path) -> ForecastResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("onnx") => Ok(ModelFormat::Onnx),
            Some("safetensors") => Ok(ModelFormat::Safetensors),
            Some("json") => Ok(ModelFormat::LinearJson),
            Some(other) => Err(ForecastError::unsupported_format(
                path,
                format!("unrecognized extension '.{other}', set model.format explicitly"),
            )),
            None => Err(ForecastError::unsupported_format(
                path,
                "no file extension, set model.format explicitly",
            )),
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFormat::Onnx => "onnx",
            ModelFormat::Safetensors => "safetensors",
            ModelFormat::LinearJson => "linear-json",
        };
        f.write_str(name)
    }
}

/// Metadata captured when the artifact is loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub format: ModelFormat,
    pub n_features: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

/// A model handle together with its load metadata
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn Regressor>,
    pub info: ModelInfo,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel").field("info", &self.info).finish()
    }
}

/// Compare a configured feature count against the artifact's own width
pub(crate) fn reconcile_width(model: usize, configured: Option<usize>) -> ForecastResult<usize> {
    match configured {
        Some(configured) if configured != model => {
            Err(ForecastError::DimensionMismatch { model, configured })
        }
        _ => Ok(model),
    }
}

/// Load the artifact described by `config`. Any failure is fatal to startup.
pub fn load_model(config: &ModelConfig) -> ForecastResult<LoadedModel> {
    let path = config.path.as_path();
    let format = match config.format {
        Some(format) => format,
        None => ModelFormat::from_path(path)?,
    };

    let bytes = std::fs::read(path)
        .map_err(|e| ForecastError::io(format!("reading model {}", path.display()), e))?;
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    let model: Arc<dyn Regressor> = match format {
        ModelFormat::Onnx => Arc::new(OnnxModel::from_bytes(path, &bytes, config.n_features)?),
        ModelFormat::Safetensors => {
            Arc::new(SafetensorsLinear::from_bytes(path, &bytes, config.n_features)?)
        }
        ModelFormat::LinearJson => {
            Arc::new(LinearModel::from_bytes(path, &bytes, config.n_features)?)
        }
    };

    let info = ModelInfo {
        path: path.to_path_buf(),
        format,
        n_features: model.n_features(),
        sha256,
        loaded_at: Utc::now(),
    };

    info!(
        path = %info.path.display(),
        format = %info.format,
        n_features = info.n_features,
        sha256 = %info.sha256,
        "Model loaded"
    );

    Ok(LoadedModel { model, info })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("m.onnx")).unwrap(), ModelFormat::Onnx);
        assert_eq!(ModelFormat::from_path(Path::new("m.ONNX")).unwrap(), ModelFormat::Onnx);
        assert_eq!(
            ModelFormat::from_path(Path::new("dir/m.safetensors")).unwrap(),
            ModelFormat::Safetensors
        );
        assert_eq!(ModelFormat::from_path(Path::new("m.json")).unwrap(), ModelFormat::LinearJson);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = ModelFormat::from_path(Path::new("model.joblib")).unwrap_err();
        assert!(matches!(err, ForecastError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains(".joblib"));

        assert!(ModelFormat::from_path(Path::new("model")).is_err());
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let config = ModelConfig {
            path: PathBuf::from("/nonexistent/forecast.json"),
            format: None,
            n_features: None,
        };
        let err = load_model(&config).unwrap_err();
        match err {
            ForecastError::Io { operation, source } => {
                assert_eq!(operation, "reading model /nonexistent/forecast.json");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn load_records_model_info() {
        let dir = tempfile::tempdir().unwrap();
        let body = br#"{"intercept": 1.0, "coefficients": [2.0, 3.0]}"#;
        let path = write_file(&dir, "model.json", body);

        let loaded = load_model(&ModelConfig {
            path: path.clone(),
            format: None,
            n_features: None,
        })
        .unwrap();

        assert_eq!(loaded.info.path, path);
        assert_eq!(loaded.info.format, ModelFormat::LinearJson);
        assert_eq!(loaded.info.n_features, 2);
        assert_eq!(loaded.info.sha256, format!("{:x}", Sha256::digest(body)));
        assert_eq!(loaded.model.predict(&[1.0, 1.0]).unwrap(), 6.0);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let body = br#"{"intercept": 0.0, "coefficients": [1.0]}"#;
        let path = write_file(&dir, "weights.bin", body);

        let loaded = load_model(&ModelConfig {
            path,
            format: Some(ModelFormat::LinearJson),
            n_features: Some(1),
        })
        .unwrap();
        assert_eq!(loaded.info.format, ModelFormat::LinearJson);
    }

    #[test]
    fn configured_width_must_match_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let body = br#"{"intercept": 0.0, "coefficients": [1.0, 2.0]}"#;
        let path = write_file(&dir, "model.json", body);

        let err = load_model(&ModelConfig {
            path,
            format: None,
            n_features: Some(5),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::DimensionMismatch {
                model: 2,
                configured: 5
            }
        ));
    }

    #[test]
    fn corrupt_artifacts_fail_for_every_format() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bad.onnx", "bad.safetensors", "bad.json"] {
            let path = write_file(&dir, name, b"\x00\x01definitely not a model");
            let result = load_model(&ModelConfig {
                path,
                format: None,
                n_features: Some(3),
            });
            assert!(result.is_err(), "{name} should not load");
        }
    }
}
