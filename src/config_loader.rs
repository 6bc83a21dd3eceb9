use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ForecastError, ForecastResult};
use crate::model::ModelFormat;

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "forecast.toml";

/// Environment prefix; nested keys are split on `__`
pub const ENV_PREFIX: &str = "FORECAST_";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ForecastConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// Overrides format detection by file extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ModelFormat>,
    /// Required for ONNX graphs whose input width is dynamic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("electricity_forecast_model.onnx")
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: default_model_path(),
            format: None,
            n_features: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_filter(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> ForecastResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(ForecastError::config("server.host cannot be empty"));
        }
        if self.model.path.as_os_str().is_empty() {
            return Err(ForecastError::config("model.path cannot be empty"));
        }
        if self.model.n_features == Some(0) {
            return Err(ForecastError::config("model.n_features must be positive"));
        }
        Ok(())
    }
}

/// Layered figment: defaults, then the TOML file, then `FORECAST_*` env vars.
///
/// An explicit `config_path` is read exactly as given; only the default
/// `forecast.toml` is looked up leniently (optional, parent dirs searched).
pub fn figment(config_path: Option<&Path>) -> Figment {
    let file = match config_path {
        Some(path) => Toml::file_exact(path),
        None => Toml::file(DEFAULT_CONFIG_FILE),
    };

    Figment::from(Serialized::defaults(ForecastConfig::default()))
        .merge(file)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config(config_path: Option<&Path>) -> ForecastResult<ForecastConfig> {
    if let Some(path) = config_path {
        if !path.is_file() {
            return Err(ForecastError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
    }

    let config: ForecastConfig = figment(config_path).extract()?;
    config.validate()?;
    Ok(config)
}
