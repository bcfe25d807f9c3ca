//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Disbursement attempt fails:
//!     → backoff.rs (capped exponential delay before the next ledger attempt)
//! Winner processing fails:
//!     → backoff.rs (linear delay before the next per-winner pass)
//! ```
//!
//! # Design Decisions
//! - Delays are deterministic; the schedule is part of the disbursement contract
//! - Sleeps are plain `tokio::time::sleep`, never cancelled mid-run

pub mod backoff;

pub use backoff::{exponential_backoff, linear_backoff};
