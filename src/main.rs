use clap::Parser;
use std::path::PathBuf;

use deploy_gateway::config::{load_config, ConfigOverrides};
use deploy_gateway::lifecycle::startup;
use deploy_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "deploy-gateway")]
#[command(about = "API gateway for the deployment dashboard", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base URL, tried before the built-in fallbacks.
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(
        cli.config.as_deref(),
        ConfigOverrides {
            bind_address: cli.bind,
            backend_url: cli.backend_url,
        },
    )?;

    logging::init_logging(&config.observability);
    tracing::info!("deploy-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
