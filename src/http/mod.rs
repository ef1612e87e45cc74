//! HTTP API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, CORS, timeout)
//!     → handlers.rs (decode, call EscrowService, encode)
//!     → error.rs (map service errors to status codes and JSON bodies)
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
