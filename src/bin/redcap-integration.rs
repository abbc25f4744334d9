use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use redcap_integration::config::ConfigLocator;
use redcap_integration::lifecycle::Integration;
use redcap_integration::server;
use redcap_integration::utils::logging;
use redcap_integration::utils::logging::LogLevel;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// folder holding radar.yml; searched before the system folder
    #[arg(short, long, env = "REDCAP_INTEGRATION_CONFIG_FOLDER")]
    config_dir: Option<PathBuf>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// load and validate the configuration, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let snapshot = Arc::new(ConfigLocator::with_override(args.config_dir).load().await?);
    logging::run(&snapshot, args.log_level);
    info!("configuration loaded: {}", snapshot);

    if args.check_config {
        info!("configuration is valid");
        return Ok(());
    }

    // -------------------------------
    // 2. Start the integration core
    // -------------------------------

    let integration = Arc::new(Integration::on_start(snapshot.clone()).await?);

    // -------------------------------
    // 3. Serve health and metrics until shutdown
    // -------------------------------

    let settings = snapshot.settings().clone();
    let http_server = {
        let integration = integration.clone();
        tokio::spawn(async move { server::server::start(&settings, integration).await })
    };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("cannot listen for shutdown signal: {}", e);
            }
            info!("shutting down ...");
        }
        served = http_server => {
            match served {
                Ok(Err(e)) => error!("http server stopped: {:#}", e),
                Err(e) => error!("http server task failed: {}", e),
                Ok(Ok(())) => info!("http server stopped"),
            }
        }
    }

    integration.on_stop().await;
    Ok(())
}
