//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured `tracing` events everywhere, with fields instead of
//!   formatted strings
//! - Request ID flows through the HTTP layer into every span
//! - Tracking numbers are only logged at debug level

pub mod logging;

pub use logging::init_logging;
