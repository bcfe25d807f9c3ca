//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events to stdout)
//!     → metrics.rs (counters and gauges, optional Prometheus scrape)
//!     → activity.rs (append-only run log + final summary)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never interpolated secrets
//! - The activity log is written by the core but never read back by it

pub mod activity;
pub mod logging;
pub mod metrics;

pub use activity::{ActivityEvent, ActivityLog, EventKind, RunSummary};
