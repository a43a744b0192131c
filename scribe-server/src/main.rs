use clap::Parser;
use scribe_core::{ScribeConfig, ScribeError};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use scribe_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file (optional; defaults apply when missing)
    #[arg(short, long, default_value = "scribe.toml")]
    config: String,

    /// Override `[http] host`
    #[arg(long)]
    host: Option<String>,

    /// Override `[http] port`
    #[arg(short, long)]
    port: Option<u16>,
}

/// File and environment config, then command-line overrides on top.
fn load_config(args: &Args) -> Result<ScribeConfig, ScribeError> {
    let mut config = ScribeConfig::load(&args.config)?;
    if let Some(host) = &args.host {
        config.http.host = host.clone();
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging, RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let state = match HttpState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        classifier = state.service.classifier_name(),
        timeout_ms = config.classifier.timeout_ms,
        "Classification service ready"
    );

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(config, state, tx.subscribe()).await?;

    tracing::info!("Scribe server stopped");
    Ok(())
}
