//! Token disbursement.
//!
//! # Data Flow
//! ```text
//! Vec<Winner>
//!     → processor.rs (sequential, outer retry per winner, linear delay)
//!         → coordinator.rs (pending lock, inner retry, exponential delay)
//!             → Ledger (find/create token account, transfer)
//!         → Notifier (best-effort reply after a confirmed transfer)
//!     → ProcessingReport { paid, failed }
//! ```
//!
//! # State Transitions (per address, state.rs)
//! ```text
//! NotStarted → Pending: disburse() claims the address
//! Pending → Succeeded: transfer confirmed (terminal)
//! Pending → NotStarted: attempts exhausted or the call was dropped
//! ```

pub mod coordinator;
pub mod processor;
pub mod state;

pub use coordinator::{DisbursementOutcome, TransferCoordinator};
pub use processor::{ProcessingReport, WinnerProcessor};
pub use state::{Claim, PendingGuard, TransferState, TransferTable};
