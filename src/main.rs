// forecast-serve entry point: config, logging, then the chosen command

use clap::Parser;
use forecast_serve::cli::{dispatch, Cli};
use forecast_serve::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    logging::init(&config.log);

    dispatch(cli, config)
}
