//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the static-file fallback
//! - Wire up middleware (tracing, request ID)
//! - Gate methods and dispatch `?q=` lookups to the tracking client
//! - Bind to the listener and drain on shutdown

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::convert::Infallible;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::RelayRequestId;
use crate::http::response;
use crate::tracking::TrackingClient;

/// Query parameter carrying the tracking number.
pub const TRACKING_QUERY_PARAM: &str = "q";

/// State shared by every request. Read-only.
#[derive(Clone)]
pub struct RelayState {
    pub client: TrackingClient,
    /// Parent of every per-request cancellation token.
    pub shutdown: CancellationToken,
}

/// HTTP server for the tracking relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
    shutdown: CancellationToken,
}

impl RelayServer {
    /// Create a server serving static files from `config.static_files.root`.
    pub fn new(config: RelayConfig, client: TrackingClient) -> Self {
        let files = ServeDir::new(&config.static_files.root);
        Self::with_files(config, client, files)
    }

    /// Create a server with a caller-supplied static-file service.
    pub fn with_files<F>(config: RelayConfig, client: TrackingClient, files: F) -> Self
    where
        F: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        F::Response: IntoResponse,
        F::Future: Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let state = RelayState {
            client,
            shutdown: shutdown.clone(),
        };
        let router = build_router(state, files);

        Self {
            router,
            config,
            shutdown,
        }
    }

    /// Token that stops the server and cancels in-flight upstream calls.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown token fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            static_root = %self.config.static_files.root,
            "HTTP server starting"
        );

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router: static files as the fallback, the relay gate in front
/// of it, then request id and tracing layers.
pub fn build_router<F>(state: RelayState, files: F) -> Router
where
    F: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
    F::Response: IntoResponse,
    F::Future: Send + 'static,
{
    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn_with_state(state, relay_gate))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(RelayRequestId))
}

/// Method gate and `q` dispatch. Anything without a tracking query falls
/// through to the static-file service untouched.
async fn relay_gate(State(state): State<RelayState>, request: Request, next: Next) -> Response {
    match *request.method() {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return response::preflight(),
        _ => {
            tracing::debug!(method = %request.method(), path = %request.uri().path(), "Method not allowed");
            return response::method_not_allowed();
        }
    }

    match tracking_query(request.uri()) {
        Some(tracking_number) => handle_track(&state, &tracking_number).await,
        None => next.run(request).await,
    }
}

async fn handle_track(state: &RelayState, tracking_number: &str) -> Response {
    let ctx = state.shutdown.child_token();

    match state.client.track(tracking_number, &ctx).await {
        Ok(result) => {
            tracing::debug!(
                events = result.events.len(),
                status = result.status,
                "Tracking lookup succeeded"
            );
            response::tracking_response(&result)
        }
        Err(e) => {
            if e.is_cancellation() {
                tracing::warn!(error = %e, "Tracking lookup canceled");
            } else {
                tracing::error!(error = %e, "Tracking lookup failed");
            }
            response::error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// First `q` value in the query string, if present and non-empty.
pub fn tracking_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TRACKING_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
