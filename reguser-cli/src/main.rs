use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reguser_core::api::ApiServer;
use reguser_core::config::Config;
use reguser_core::logging::{init_logging_with_config, LogConfig};
use reguser_core::metrics::init_metrics;
use reguser_core::repos::Registry;
use reguser_core::shutdown::{install_signal_handlers, ShutdownCoordinator};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "reguser")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API until SIGINT/SIGTERM
    Serve,

    /// Write the effective configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "reguser.toml")]
        path: PathBuf,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;

    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config.validate()?;
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    if config.metrics.enabled {
        init_metrics();
    }

    let coordinator = Arc::new(ShutdownCoordinator::new(config.server.shutdown_timeout));
    install_signal_handlers(coordinator.clone());

    let registry = Registry::new(config.store.clone());
    let server = ApiServer::new(&config, registry, coordinator.token());

    match coordinator.run_until_shutdown("api", server.run()).await {
        Some(result) => result?,
        None => warn!("API server did not stop within the shutdown timeout"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;

    info!("reguser started");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::InitConfig { path } => {
            config.save_to_file(&path)?;
            info!("Configuration written to {}", path.display());
        }
    }

    info!("reguser finished");

    Ok(())
}
