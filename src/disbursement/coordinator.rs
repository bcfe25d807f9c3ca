//! At-most-once token disbursement with bounded retries.
//!
//! # Protocol
//! ```text
//! disburse(address)
//!     Succeeded  → AlreadyDisbursed (no network)
//!     Pending    → InFlight (caller may retry later)
//!     otherwise  → claim Pending, then up to max_attempts:
//!         find token account → create + confirm + settle if missing
//!         transfer → confirm → Succeeded
//!         on error: sleep min(base * 2^attempt, max) and retry
//!     exhausted  → release Pending, Exhausted
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;

use crate::blockchain::{Ledger, LedgerResult, TxSignature};
use crate::config::DisbursementConfig;
use crate::context::GiveawayContext;
use crate::disbursement::state::{Claim, TransferTable};
use crate::observability::{metrics, ActivityLog, EventKind};
use crate::resilience::exponential_backoff;
use crate::selection::WalletAddress;

/// Result of a single `disburse` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisbursementOutcome {
    /// This call delivered the tokens.
    Transferred { signature: String, attempts: u32 },
    /// An earlier call already delivered the tokens.
    AlreadyDisbursed { signature: String },
    /// Another call currently holds the pending lock.
    InFlight,
    /// Every attempt failed; the address is back to not started.
    Exhausted { attempts: u32, last_error: String },
}

impl DisbursementOutcome {
    /// Whether the recipient holds the tokens after this call.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            DisbursementOutcome::Transferred { .. } | DisbursementOutcome::AlreadyDisbursed { .. }
        )
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            DisbursementOutcome::Transferred { signature, .. }
            | DisbursementOutcome::AlreadyDisbursed { signature } => Some(signature),
            _ => None,
        }
    }
}

/// Drives disbursements against a ledger.
#[derive(Clone)]
pub struct TransferCoordinator {
    ledger: Arc<dyn Ledger>,
    transfers: TransferTable,
    activity: Arc<ActivityLog>,
    policy: DisbursementConfig,
    /// Whole tokens per winner, for the activity log.
    token_amount: u64,
    /// Base units per winner, sent to the ledger.
    base_units: u64,
}

impl TransferCoordinator {
    pub fn new(ctx: &GiveawayContext, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            transfers: ctx.transfers.clone(),
            activity: ctx.activity.clone(),
            policy: ctx.config.disbursement.clone(),
            token_amount: ctx.config.giveaway.token_amount,
            base_units: ctx.base_units(),
        }
    }

    /// Transfer state table this coordinator writes to.
    pub fn transfers(&self) -> &TransferTable {
        &self.transfers
    }

    /// Deliver the configured amount to `address` at most once.
    pub async fn disburse(&self, address: &WalletAddress) -> DisbursementOutcome {
        let guard = match self.transfers.claim(address) {
            Claim::Done(signature) => {
                self.activity.record(
                    EventKind::Transfer,
                    "Skipping duplicate transfer - already successful",
                    Some(json!({ "address": address })),
                );
                return DisbursementOutcome::AlreadyDisbursed { signature };
            }
            Claim::InFlight => {
                self.activity.record(
                    EventKind::Transfer,
                    "Skipping duplicate transfer - already pending",
                    Some(json!({ "address": address })),
                );
                return DisbursementOutcome::InFlight;
            }
            Claim::Acquired(guard) => guard,
        };

        let max_attempts = self.policy.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if let Some(signature) = self.transfers.signature_of(address) {
                self.activity.record(
                    EventKind::Transfer,
                    "Transfer was completed by another attempt",
                    Some(json!({ "address": address })),
                );
                return DisbursementOutcome::AlreadyDisbursed { signature };
            }

            self.activity.record(
                EventKind::Transfer,
                format!(
                    "Attempt {}/{} to send tokens to {}",
                    attempt, max_attempts, address
                ),
                None,
            );

            match self.attempt(address).await {
                Ok(TxSignature(signature)) => {
                    guard.complete(signature.clone());
                    metrics::record_transfer_attempt("success");
                    self.activity.record(
                        EventKind::Transfer,
                        "Transfer successful",
                        Some(json!({
                            "attempt": attempt,
                            "amount": self.token_amount,
                            "recipient": address,
                            "signature": signature,
                        })),
                    );
                    return DisbursementOutcome::Transferred {
                        signature,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    metrics::record_transfer_attempt("failure");
                    tracing::warn!(%address, attempt, error = %e, "Transfer attempt failed");
                    self.activity.record(
                        EventKind::Error,
                        format!("Transfer attempt {} failed", attempt),
                        Some(json!(e.to_string())),
                    );
                    last_error = e.to_string();

                    if attempt < max_attempts {
                        let delay = exponential_backoff(
                            attempt,
                            self.policy.base_delay_ms,
                            self.policy.max_delay_ms,
                        );
                        self.activity.record(
                            EventKind::Retry,
                            format!("Waiting {}ms before retry", delay.as_millis()),
                            None,
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        self.activity.record(
            EventKind::Error,
            format!("All {} transfer attempts failed", max_attempts),
            Some(json!(last_error)),
        );
        drop(guard);

        DisbursementOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }

    /// One pass: make sure the token account exists, then transfer.
    async fn attempt(&self, address: &WalletAddress) -> LedgerResult<TxSignature> {
        let account = match self.ledger.find_token_account(address).await? {
            Some(account) => account,
            None => {
                self.activity.record(
                    EventKind::Transfer,
                    "Creating token account for winner",
                    Some(json!({ "address": address })),
                );
                let account = self.ledger.create_token_account(address).await?;
                if self.policy.account_settle_ms > 0 {
                    sleep(Duration::from_millis(self.policy.account_settle_ms)).await;
                }
                account
            }
        };

        self.ledger.transfer(&account, self.base_units).await
    }
}

impl std::fmt::Debug for TransferCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferCoordinator")
            .field("policy", &self.policy)
            .field("base_units", &self.base_units)
            .finish()
    }
}
