//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → method gate (GET/HEAD pass, OPTIONS acknowledged, rest 405)
//!     → `q` present: tracking client → response.rs (envelope)
//!     → `q` absent: static file service
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RelayRequestId, X_REQUEST_ID};
pub use response::{render_envelope, ALLOWED_METHODS};
pub use server::{build_router, tracking_query, RelayServer, RelayState};
