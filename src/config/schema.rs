//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};

/// Root configuration for the tracking relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Courier tracking endpoint.
    pub upstream: UpstreamConfig,

    /// Directory served when no tracking query is present.
    pub static_files: StaticFilesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80" or ":80").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Parsed bind address. A bare `:port` listens on every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        match self.bind_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port).parse(),
            None => self.bind_address.parse(),
        }
    }
}

/// Upstream tracking endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host of the courier site; the tracking path is appended.
    pub base_url: String,

    /// Deadline for one upstream call, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://track.sendfromchina.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "www".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
