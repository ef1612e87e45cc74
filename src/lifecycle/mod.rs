//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast to every long-running task
//!     → HTTP server stops accepting and drains
//!     → lifecycle engine finishes its current pass and exits
//!     → config watcher exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
