//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the merged configuration
//! - Build the tracking client and the HTTP server
//! - Bind the listener and serve until a shutdown signal arrives

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{validate_config, RelayConfig, ValidationError};
use crate::http::RelayServer;
use crate::lifecycle::signals::shutdown_signal;
use crate::tracking::{ClientError, TrackingClient};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join(.0))]
    Config(Vec<ValidationError>),

    #[error("build tracking client: {0}")]
    Client(ClientError),

    #[error("bind {address}: {error}")]
    Bind { address: String, error: std::io::Error },

    #[error("serve: {0}")]
    Serve(std::io::Error),
}

impl From<ClientError> for StartupError {
    fn from(e: ClientError) -> Self {
        StartupError::Client(e)
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run the relay with `config` until Ctrl+C or SIGTERM.
pub async fn start(config: RelayConfig) -> Result<(), StartupError> {
    validate_config(&config).map_err(StartupError::Config)?;

    let client = TrackingClient::from_config(&config.upstream)?;
    tracing::info!(
        endpoint = %client.endpoint().map(|u| u.to_string()).unwrap_or_default(),
        timeout_secs = config.upstream.timeout_secs,
        "Tracking client ready"
    );

    let bind_address = config.listener.bind_address.clone();
    let addr = config
        .listener
        .socket_addr()
        .map_err(|_| StartupError::Config(vec![ValidationError::BindAddress(bind_address.clone())]))?;
    let server = RelayServer::new(config, client);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|error| StartupError::Bind {
            address: bind_address,
            error,
        })?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    server.run(listener).await.map_err(StartupError::Serve)
}
