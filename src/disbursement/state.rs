//! Per-address transfer state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::selection::WalletAddress;

/// State of an address that has been touched. Absent means not started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    /// A disbursement is in flight.
    Pending { started_at: DateTime<Utc> },
    /// Tokens delivered. Never leaves this state.
    Succeeded {
        signature: String,
        completed_at: DateTime<Utc>,
    },
}

impl TransferState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransferState::Pending { .. })
    }
}

/// Result of trying to start a disbursement.
#[derive(Debug)]
pub enum Claim {
    /// The caller now owns the pending lock.
    Acquired(PendingGuard),
    /// Another caller holds the pending lock.
    InFlight,
    /// Already delivered, with the recorded signature.
    Done(String),
}

/// A thread-safe table of transfer states keyed by address.
#[derive(Debug, Clone, Default)]
pub struct TransferTable {
    inner: Arc<DashMap<WalletAddress, TransferState>>,
}

impl TransferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically move `address` from not started to pending.
    pub fn claim(&self, address: &WalletAddress) -> Claim {
        match self.inner.entry(address.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                TransferState::Pending { .. } => Claim::InFlight,
                TransferState::Succeeded { signature, .. } => Claim::Done(signature.clone()),
            },
            Entry::Vacant(entry) => {
                entry.insert(TransferState::Pending {
                    started_at: Utc::now(),
                });
                Claim::Acquired(PendingGuard {
                    table: self.clone(),
                    address: address.clone(),
                    completed: false,
                })
            }
        }
    }

    /// Current state, `None` when not started.
    pub fn get(&self, address: &WalletAddress) -> Option<TransferState> {
        self.inner.get(address).map(|r| r.value().clone())
    }

    /// Signature of a completed transfer.
    pub fn signature_of(&self, address: &WalletAddress) -> Option<String> {
        match self.inner.get(address)?.value() {
            TransferState::Succeeded { signature, .. } => Some(signature.clone()),
            TransferState::Pending { .. } => None,
        }
    }

    pub fn is_pending(&self, address: &WalletAddress) -> bool {
        self.inner
            .get(address)
            .map(|r| r.value().is_pending())
            .unwrap_or(false)
    }

    /// Number of completed transfers.
    pub fn succeeded_count(&self) -> usize {
        self.inner.iter().filter(|r| !r.value().is_pending()).count()
    }

    fn release(&self, address: &WalletAddress) {
        self.inner.remove_if(address, |_, state| state.is_pending());
    }

    fn complete(&self, address: &WalletAddress, signature: String) {
        self.inner.insert(
            address.clone(),
            TransferState::Succeeded {
                signature,
                completed_at: Utc::now(),
            },
        );
    }
}

/// Ownership of a pending lock.
///
/// Dropping the guard without calling [`PendingGuard::complete`] reverts the
/// address to not started, so an abandoned disbursement never stays pending.
#[derive(Debug)]
pub struct PendingGuard {
    table: TransferTable,
    address: WalletAddress,
    completed: bool,
}

impl PendingGuard {
    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// Record the transfer as delivered.
    pub fn complete(mut self, signature: impl Into<String>) {
        self.table.complete(&self.address, signature.into());
        self.completed = true;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.table.release(&self.address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> WalletAddress {
        "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".parse().unwrap()
    }

    #[test]
    fn test_claim_lifecycle() {
        let table = TransferTable::new();
        let address = addr();
        assert!(table.get(&address).is_none());

        let guard = match table.claim(&address) {
            Claim::Acquired(guard) => guard,
            other => panic!("expected Acquired, got {:?}", other),
        };
        assert!(table.is_pending(&address));
        assert!(matches!(table.claim(&address), Claim::InFlight));

        guard.complete("sig-1");
        assert_eq!(table.signature_of(&address), Some("sig-1".to_string()));
        assert!(matches!(table.claim(&address), Claim::Done(ref s) if s == "sig-1"));
        assert_eq!(table.succeeded_count(), 1);
    }

    #[test]
    fn test_dropped_guard_reverts_to_not_started() {
        let table = TransferTable::new();
        let address = addr();

        if let Claim::Acquired(guard) = table.claim(&address) {
            drop(guard);
        }
        assert!(table.get(&address).is_none());
        assert!(matches!(table.claim(&address), Claim::Acquired(_)));
    }

    #[test]
    fn test_clones_share_state() {
        let table = TransferTable::new();
        let other = table.clone();
        let address = addr();

        let _guard = table.claim(&address);
        assert!(other.is_pending(&address));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let table = TransferTable::new();
        let address = addr();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let table = table.clone();
                let address = address.clone();
                std::thread::spawn(move || match table.claim(&address) {
                    Claim::Acquired(guard) => {
                        guard.complete("sig");
                        1
                    }
                    _ => 0,
                })
            })
            .collect();

        let acquired: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(acquired, 1);
        assert_eq!(table.signature_of(&address), Some("sig".to_string()));
    }
}
