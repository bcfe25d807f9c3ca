//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment / config (signer secret, RPC URL, token mint)
//!     → wallet.rs (keypair loading)
//!     → client.rs (token account lookup/creation, transfer, confirmation)
//!     → confirmation.rs (settling transfers whose confirmation was lost)
//!     → Ledger trait (types.rs), the only surface the core sees
//! ```
//!
//! # Security Constraints
//! - Signing keys ONLY from configuration or environment variables
//! - Never log private keys
//! - Every RPC call has a timeout
//! - A transaction is never re-signed while an earlier one can still land

#[cfg(feature = "solana")]
pub mod client;
#[cfg(feature = "solana")]
pub mod confirmation;
pub mod types;
#[cfg(feature = "solana")]
pub mod wallet;

#[cfg(feature = "solana")]
pub use client::SolanaLedger;
pub use types::{Ledger, LedgerError, LedgerResult, TokenAccount, TxSignature};
