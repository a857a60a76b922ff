//! Shipment tracking relay.
//!
//! Accepts `?q=<tracking number>` over HTTP, forwards the lookup to the
//! courier's tracking endpoint, and answers with both the normalized result
//! and the untouched upstream JSON. Requests without a query are served from
//! a static directory.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tracking;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use tracking::{TrackingClient, TrackingResult};
