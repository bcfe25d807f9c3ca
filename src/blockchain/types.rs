//! Ledger seam and error definitions.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::WalletAddress;

/// Token-holding account of a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAccount(pub String);

impl TokenAccount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Signature of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxSignature(pub String);

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Call did not complete in time.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction could not be built or was rejected.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Invalid signing key.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// A key or address the ledger cannot parse.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Token transfer primitives.
///
/// Every write returns only after the transaction is confirmed. Failures are
/// assumed transient; callers decide whether to retry.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Token account of `owner` for the configured mint, if it exists.
    async fn find_token_account(&self, owner: &WalletAddress) -> LedgerResult<Option<TokenAccount>>;

    /// Create the token account of `owner`. Creating an existing account is not an error.
    async fn create_token_account(&self, owner: &WalletAddress) -> LedgerResult<TokenAccount>;

    /// Transfer `amount` base units from the paying wallet to `destination`.
    async fn transfer(&self, destination: &TokenAccount, amount: u64) -> LedgerResult<TxSignature>;
}
