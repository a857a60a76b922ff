//! Shipment tracking relay.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /?q=LP00123            ┌──────────────┐   POST /track/track/get-track-for-web
//!     ──────────────────────────▶│  http server │──────────────────────────────────────▶ Courier
//!                                │  method gate │                                        tracking
//!     {"data": .., "raw": ..}    │  q dispatch  │◀────────────── JSON bytes ───────────── endpoint
//!     ◀──────────────────────────│              │
//!                                └──────┬───────┘
//!     GET /index.html                   │ no q
//!     ──────────────────────────────────▼
//!                                  static files
//! ```

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use sfc_relay::config::{read_config, validate_config, RelayConfig};
use sfc_relay::http::render_envelope;
use sfc_relay::lifecycle::{self, shutdown_signal};
use sfc_relay::observability::init_logging;
use sfc_relay::tracking::TrackingClient;

#[derive(Parser)]
#[command(name = "sfc-relay")]
#[command(about = "Shipment tracking relay with static file fallback", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the relay (default)
    Serve(ServeArgs),
    /// Look up one tracking number and print the response envelope
    Track(TrackArgs),
}

#[derive(Args, Default)]
struct UpstreamArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream base URL
    #[arg(long)]
    upstream: Option<String>,

    /// Upstream deadline in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Args, Default)]
struct ServeArgs {
    #[command(flatten)]
    common: UpstreamArgs,

    /// Listen address, `host:port` or `:port` for every interface
    #[arg(long)]
    addr: Option<String>,

    /// Static file root
    #[arg(long)]
    www: Option<String>,
}

#[derive(Args)]
struct TrackArgs {
    #[command(flatten)]
    common: UpstreamArgs,

    /// Tracking number, forwarded verbatim
    number: String,
}

/// Defaults, then the config file, then flags.
fn resolve_config(args: &UpstreamArgs) -> Result<RelayConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => RelayConfig::default(),
    };

    if let Some(upstream) = &args.upstream {
        config.upstream.base_url = upstream.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.upstream.timeout_secs = timeout_secs;
    }
    if let Some(log_level) = &args.log_level {
        config.observability.log_level = log_level.clone();
    }

    Ok(config)
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = resolve_config(&args.common)?;
    if let Some(addr) = args.addr {
        config.listener.bind_address = addr;
    }
    if let Some(www) = args.www {
        config.static_files.root = www;
    }

    init_logging(&config.observability);
    tracing::info!("sfc-relay v{} starting", env!("CARGO_PKG_VERSION"));

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn track(args: TrackArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args.common)?;
    init_logging(&config.observability);

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("Configuration error: {}", e);
        }
        return Err("invalid configuration".into());
    }

    let client = TrackingClient::from_config(&config.upstream)?;

    let ctx = CancellationToken::new();
    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_ctx.cancel();
    });

    let result = client.track(&args.number, &ctx).await?;
    let body = render_envelope(&result)?;
    std::io::stdout().write_all(&body)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args).await,
        Commands::Track(args) => track(args).await,
    }
}
