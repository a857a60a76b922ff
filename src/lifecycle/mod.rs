//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Build tracking client → Build server → Bind listener
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → cancel server token → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so traffic only arrives once everything is built
//! - Shutdown cancels in-flight upstream calls through the same token

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{start, StartupError};
