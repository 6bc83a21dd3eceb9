//! Library root for the `forecast_serve` crate
//! Loads a pre-trained regression model once and serves predictions over HTTP.

// Error handling
pub mod api_errors;
pub mod errors;

// Configuration & CLI
pub mod cli;
pub mod config_loader;
pub mod logging;

// Model loading and inference
pub mod model;
pub mod predictor;

// Web server interface
pub mod app_state;
pub mod web;


pub use errors::{ForecastError, ForecastResult};
pub use model::{load_model, LoadedModel, ModelFormat, ModelInfo, Regressor};
pub use predictor::PredictionService;
