//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle engine, gateway, HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`tx_id`, `tx_hash`, `status`) on every lifecycle event
//! - Metric updates are no-ops until a recorder is installed, so tests
//!   and library users pay nothing

pub mod logging;
pub mod metrics;
