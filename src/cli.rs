use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::app_state::AppState;
use crate::config_loader::{load_config, ForecastConfig};
use crate::model::load_model;
use crate::predictor::PredictionService;

/// Top-level CLI interface for the forecast server
#[derive(Parser)]
#[command(
    name = "forecast-serve",
    version,
    about = "Serve point forecasts from a pre-trained regression model"
)]
pub struct Cli {
    /// Configuration file (defaults to ./forecast.toml, or $FORECAST_CONFIG)
    #[arg(long, global = true, env = "FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that override the model section of the configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Path to the model artifact
    #[arg(long)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the model and serve POST /predict
    Serve {
        /// Host/IP to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Load the model and print its metadata as JSON
    Check {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Run a single prediction without starting the server
    Predict {
        #[command(flatten)]
        model: ModelArgs,
        /// Comma separated feature values
        #[arg(long, value_delimiter = ',', num_args = 1.., allow_hyphen_values = true)]
        features: Vec<f64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Load layered configuration and apply flag overrides for the chosen command
    pub fn resolve_config(&self) -> anyhow::Result<ForecastConfig> {
        let mut config = load_config(self.config.as_deref()).context("Failed to load config")?;

        match &self.command {
            Commands::Serve { host, port, model } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                model.apply(&mut config);
            }
            Commands::Check { model } | Commands::Predict { model, .. } => model.apply(&mut config),
            Commands::Config => {}
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

impl ModelArgs {
    fn apply(&self, config: &mut ForecastConfig) {
        if let Some(path) = &self.model {
            config.model.path = path.clone();
        }
    }
}

pub fn dispatch(cli: Cli, config: ForecastConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { .. } => serve(config),
        Commands::Check { .. } => {
            let loaded = load_model(&config.model)?;
            println!("{}", serde_json::to_string_pretty(&loaded.info)?);
            Ok(())
        }
        Commands::Predict { features, .. } => {
            let service = PredictionService::new(load_model(&config.model)?);
            let prediction = service.predict_blocking(&features)?;
            println!("{}", serde_json::json!({ "prediction": prediction }));
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn serve(config: ForecastConfig) -> anyhow::Result<()> {
    // No traffic is accepted unless the model loads
    let loaded = load_model(&config.model).inspect_err(|e| error!("Refusing to start: {e}"))?;
    let app = crate::web::build_router(Arc::new(AppState::from_model(loaded)));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let addr = config.server.bind_addr();
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("HTTP server listening on http://{addr}");
        crate::web::serve(listener, app).await.context("Server error")
    })
}
