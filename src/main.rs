use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{LevelFilter, info, warn};
use tokio::net::TcpListener;

use ytcap::config::Config;
use ytcap::handler::{AppState, router};
use ytcap::youtube::InnerTubeProvider;

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool) -> Result<PathBuf> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytcap.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    if verbose {
        builder.filter_module("ytcap", LevelFilter::Debug);
    }
    builder
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(log_file)
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytcap")
        .join("logs")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = setup_logging(cli.verbose)?;

    // Unreadable or invalid config is reported, then defaults apply
    let config_path = cli.config.clone().unwrap_or_else(ytcap::config::config_path);
    let config = Config::load_from(&config_path).unwrap_or_else(|e| {
        warn!("Ignoring config: {e:#}");
        eprintln!("Ignoring config: {e:#}");
        Config::default()
    });

    // CLI flags take priority over the config file
    let bind = cli.bind.clone().unwrap_or_else(|| config.bind().to_string());
    let fetch_timeout = cli
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.fetch_timeout());

    let client = reqwest::Client::builder()
        .timeout(fetch_timeout)
        .build()
        .wrap_err("failed to build HTTP client")?;
    let provider = Arc::new(InnerTubeProvider::new(client));
    let state = AppState::new(provider, fetch_timeout, config.max_body_bytes());

    let listener = TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    info!("Listening on http://{bind}");
    eprintln!("Listening on http://{bind} (logs: {})", log_file.display());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
