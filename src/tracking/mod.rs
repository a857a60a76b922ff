//! Courier tracking subsystem.
//!
//! # Data Flow
//! ```text
//! tracking number
//!     → client.rs (form POST to the upstream endpoint)
//!     → upstream JSON bytes, captured whole
//!     → decode.rs (generic JSON → per-entity decode steps)
//!     → TrackingResult (parsed fields + the captured bytes)
//! ```

pub mod client;
pub mod decode;
pub mod types;

pub use client::{ClientError, RequestError, TrackingClient};
pub use decode::{decode, DecodeError, FormatError, StructuralError};
pub use types::{Country, OrderInfo, TrackingEvent, TrackingResult};
