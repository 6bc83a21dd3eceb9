//! Error types for the forecast service
//!
//! `ForecastError` covers startup and library failures (configuration, model
//! loading). Request-time failures use the closed `ApiError` taxonomy in
//! `api_errors`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for model loading and service wiring
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to load model from {}: {message}", .path.display())]
    ModelLoad { path: PathBuf, message: String },

    #[error("Unsupported model format for {}: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Model expects {model} features but {configured} were configured")]
    DimensionMismatch { model: usize, configured: usize },

    #[error("Inference failed: {message}")]
    Inference { message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate
pub type ForecastResult<T> = Result<T, ForecastError>;

impl ForecastError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a model load error for the artifact at `path`
    pub fn model_load(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create an inference error
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl From<figment::Error> for ForecastError {
    fn from(err: figment::Error) -> Self {
        ForecastError::config(err.to_string())
    }
}
