use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use relay::{
    adapters::proxy_router,
    config::{ProxyConfigValidator, load_config, models::ProxyConfig},
    core::ProxyService,
    tracing_setup,
    utils::shutdown_signal,
};
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Start the proxy server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn load_validated(config_path: &str) -> Result<ProxyConfig> {
    let config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    ProxyConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}: {e}"))?;
    Ok(config)
}

async fn validate_config_command(config_path: &str) -> Result<()> {
    let config = load_validated(config_path).await?;
    println!(
        "Configuration {config_path} is valid (target: {}, listen: {})",
        config.target, config.listen_addr
    );
    Ok(())
}

async fn serve(config_path: &str) -> Result<()> {
    let config = load_validated(config_path).await?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    // Target problems surface here, before any request is accepted
    let proxy = ProxyService::from_config(&config).context("Failed to configure proxy")?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Relay listening on {} -> {}", addr, proxy.target());

    let app = proxy_router(Arc::new(proxy)).layer(TraceLayer::new_for_http());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
        })
        .await
        .context("Server error")?;

    tracing::info!("Relay stopped");
    Ok(())
}
