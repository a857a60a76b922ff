//! Upstream tracking client.
//!
//! # Responsibilities
//! - Build the form-encoded POST for one tracking number
//! - Send it through the injected `reqwest::Client`
//! - Capture the full response body, then hand it to the decoder
//! - Honor the caller's cancellation token and the per-call deadline

use hyper::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::UpstreamConfig;
use crate::tracking::decode::{decode, DecodeError};
use crate::tracking::types::TrackingResult;

/// Path of the tracking endpoint, relative to the configured base URL.
pub const TRACK_PATH: [&str; 3] = ["track", "track", "get-track-for-web"];

/// Form key carrying the tracking number.
pub const TRACK_FORM_KEY: &str = "tracknumber";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be built or the transport failed.
    #[error("upstream request failed: {0}")]
    Request(RequestError),

    #[error("decode upstream response: {0}")]
    Decode(DecodeError),

    #[error("tracking request canceled")]
    Cancelled,

    #[error("tracking request exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl ClientError {
    /// True when the caller's token or deadline ended the call.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::Cancelled | ClientError::DeadlineExceeded(_))
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid base URL {url:?}: {error}")]
    ParseUrl { url: String, error: url::ParseError },

    #[error("base URL {0} cannot carry a path")]
    InvalidBaseUrl(Url),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl From<RequestError> for ClientError {
    fn from(e: RequestError) -> Self {
        ClientError::Request(e)
    }
}

impl From<DecodeError> for ClientError {
    fn from(e: DecodeError) -> Self {
        ClientError::Decode(e)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Request(RequestError::Transport(e))
    }
}

/// Client for the courier's tracking endpoint.
///
/// Holds no per-request state; clones share the underlying connection pool.
#[derive(Clone)]
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: Url,
    deadline: Option<Duration>,
}

impl TrackingClient {
    /// Wrap an existing transport. No deadline is applied beyond whatever the
    /// transport itself enforces.
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            deadline: None,
        }
    }

    /// Build a client from validated upstream configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|error| RequestError::ParseUrl {
            url: config.base_url.clone(),
            error,
        })?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::new(http, base_url).with_deadline(Duration::from_secs(config.timeout_secs)))
    }

    /// Bound every call to `deadline`, measured from the start of `track`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the tracking endpoint.
    pub fn endpoint(&self) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(TRACK_PATH);
        Ok(url)
    }

    /// Look up one tracking number.
    ///
    /// The number is forwarded verbatim. Upstream answers every lookup with
    /// a JSON body, so any received body is decoded regardless of status.
    pub async fn track(
        &self,
        tracking_number: &str,
        ctx: &CancellationToken,
    ) -> Result<TrackingResult, ClientError> {
        let body = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ClientError::Cancelled),
            body = self.fetch_with_deadline(tracking_number) => body?,
        };

        tracing::debug!(bytes = body.len(), "Decoding upstream response");
        Ok(decode(body)?)
    }

    async fn fetch_with_deadline(&self, tracking_number: &str) -> Result<Bytes, ClientError> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.fetch(tracking_number))
                .await
                .map_err(|_| ClientError::DeadlineExceeded(deadline))?,
            None => self.fetch(tracking_number).await,
        }
    }

    /// Send the request and read the whole body. Dropping this future drops
    /// the response, which releases the connection.
    async fn fetch(&self, tracking_number: &str) -> Result<Bytes, ClientError> {
        let url = self.endpoint()?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(TRACK_FORM_KEY, tracking_number)
            .finish();

        tracing::debug!(url = %url, tracking_number = %tracking_number, "Sending upstream tracking request");

        let mut response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Upstream returned non-success status, decoding body anyway");
        }

        let mut captured = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            captured.extend_from_slice(&chunk);
        }

        Ok(Bytes::from(captured))
    }
}

impl std::fmt::Debug for TrackingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingClient")
            .field("base_url", &self.base_url.as_str())
            .field("deadline", &self.deadline)
            .finish()
    }
}
