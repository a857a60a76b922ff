//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url {0:?} is not a valid URL")]
    BaseUrl(String),

    #[error("upstream.base_url {0:?} must use http or https")]
    BaseUrlScheme(String),

    #[error("upstream.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("static_files.root must not be empty")]
    EmptyStaticRoot,
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(ValidationError::BaseUrl(config.upstream.base_url.clone()));
        }
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::BaseUrlScheme(config.upstream.base_url.clone()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::BaseUrl(config.upstream.base_url.clone())),
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.static_files.root.trim().is_empty() {
        errors.push(ValidationError::EmptyStaticRoot);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
