//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and stores produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span

pub mod logging;
pub mod metrics;
