//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine / fetch chains produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges through the `metrics` facade)
//!
//! Consumers:
//!     → fmt subscriber on stderr (CLI)
//!     → whatever recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing subscribers and recorders is left to
//!   the binary or the embedding application
//! - Metrics are cheap (atomic increments); without a recorder they are no-ops

pub mod logging;
pub mod metrics;
