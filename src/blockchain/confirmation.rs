//! Settling transactions whose confirmation was lost.
//!
//! A submit-and-confirm call can fail after the transaction was broadcast.
//! The transaction may still land until its blockhash expires, so a fresh
//! transaction must not be signed before the first one is known dead.
//!
//! ```text
//! unknown outcome
//!     → poll signature status
//!         confirmed          → Ok(signature)
//!         executed with err  → Rejected (no transfer happened)
//!         not seen           → blockhash still valid? keep polling
//!                              blockhash expired?    → original error
//!     → tracking limit hit   → original error
//! ```

use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use tokio::time::{sleep, Instant};

use crate::blockchain::types::{LedgerError, LedgerResult};

/// What the cluster knows about a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// Executed successfully at the required commitment.
    Confirmed,
    /// Executed and failed; its instructions had no effect.
    Failed(String),
    /// Seen but not yet at the required commitment.
    Processing,
    /// Not in the status cache.
    Unknown,
}

/// Status lookups needed to settle an unconfirmed transaction.
#[async_trait]
pub trait SignatureTracker: Send + Sync {
    async fn landing(&self, signature: &Signature) -> LedgerResult<Landing>;

    /// Whether a transaction signed with `blockhash` can still be processed.
    async fn blockhash_valid(&self, blockhash: &Hash) -> LedgerResult<bool>;
}

/// Polling cadence and overall bound.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilePolicy {
    pub poll_interval: Duration,
    pub limit: Duration,
}

/// Decide the outcome of a transaction whose submission failed with `cause`.
///
/// Returns the signature if it landed, `Rejected` if it executed with an
/// error, and `cause` once it can no longer land or tracking gives up.
pub async fn reconcile<T>(
    tracker: &T,
    signature: &Signature,
    blockhash: &Hash,
    policy: ReconcilePolicy,
    cause: LedgerError,
) -> LedgerResult<Signature>
where
    T: SignatureTracker + ?Sized,
{
    let deadline = Instant::now() + policy.limit;
    let mut expired = false;

    loop {
        match tracker.landing(signature).await {
            Ok(Landing::Confirmed) => {
                tracing::warn!(%signature, error = %cause, "Transaction landed despite submission error");
                return Ok(*signature);
            }
            Ok(Landing::Failed(reason)) => return Err(LedgerError::Rejected(reason)),
            Ok(Landing::Unknown) if expired => {
                tracing::debug!(%signature, "Blockhash expired, transaction never landed");
                return Err(cause);
            }
            Ok(Landing::Unknown) | Ok(Landing::Processing) => {}
            Err(e) => tracing::debug!(%signature, error = %e, "Signature status unavailable"),
        }

        if Instant::now() >= deadline {
            tracing::error!(%signature, "Gave up tracking unconfirmed transaction");
            return Err(cause);
        }

        if !expired {
            match tracker.blockhash_valid(blockhash).await {
                Ok(valid) => expired = !valid,
                Err(e) => tracing::debug!(error = %e, "Blockhash validity unavailable"),
            }
            // One more status read once expiry is known
            if expired {
                continue;
            }
        }

        sleep(policy.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted cluster view. Exhausted scripts repeat `Unknown` / valid.
    struct ScriptedCluster {
        statuses: Mutex<VecDeque<Option<Landing>>>,
        valid_checks: AtomicU32,
        status_reads: AtomicU32,
    }

    impl ScriptedCluster {
        /// `None` entries simulate an unreachable RPC.
        fn new(statuses: Vec<Option<Landing>>, valid_checks: u32) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                valid_checks: AtomicU32::new(valid_checks),
                status_reads: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SignatureTracker for ScriptedCluster {
        async fn landing(&self, _signature: &Signature) -> LedgerResult<Landing> {
            self.status_reads.fetch_add(1, Ordering::SeqCst);
            match self.statuses.lock().unwrap().pop_front() {
                Some(Some(landing)) => Ok(landing),
                Some(None) => Err(LedgerError::Rpc("connection refused".into())),
                None => Ok(Landing::Unknown),
            }
        }

        async fn blockhash_valid(&self, _blockhash: &Hash) -> LedgerResult<bool> {
            Ok(self
                .valid_checks
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok())
        }
    }

    fn policy() -> ReconcilePolicy {
        ReconcilePolicy {
            poll_interval: Duration::from_secs(2),
            limit: Duration::from_secs(120),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_transfer_that_landed_is_success() {
        let cluster = ScriptedCluster::new(vec![Some(Landing::Confirmed)], 10);
        let signature = Signature::new_unique();

        let result = reconcile(
            &cluster,
            &signature,
            &Hash::new_unique(),
            policy(),
            LedgerError::Timeout(60),
        )
        .await;

        assert_eq!(result.unwrap(), signature);
        assert_eq!(cluster.status_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_landing_is_waited_for() {
        let cluster = ScriptedCluster::new(
            vec![
                Some(Landing::Unknown),
                None,
                Some(Landing::Processing),
                Some(Landing::Confirmed),
            ],
            10,
        );
        let signature = Signature::new_unique();

        let result = reconcile(
            &cluster,
            &signature,
            &Hash::new_unique(),
            policy(),
            LedgerError::Timeout(60),
        )
        .await;

        assert_eq!(result.unwrap(), signature);
        assert_eq!(cluster.status_reads.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_blockhash_returns_original_error() {
        let cluster = ScriptedCluster::new(Vec::new(), 2);

        let result = reconcile(
            &cluster,
            &Signature::new_unique(),
            &Hash::new_unique(),
            policy(),
            LedgerError::Timeout(60),
        )
        .await;

        assert!(matches!(result, Err(LedgerError::Timeout(60))));
        // Two polls while valid, the read that sees expiry, the final read
        assert_eq!(cluster.status_reads.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_landing_just_before_expiry_counts() {
        let cluster = ScriptedCluster::new(vec![Some(Landing::Unknown), Some(Landing::Confirmed)], 0);
        let signature = Signature::new_unique();

        let result = reconcile(
            &cluster,
            &signature,
            &Hash::new_unique(),
            policy(),
            LedgerError::Timeout(60),
        )
        .await;

        assert_eq!(result.unwrap(), signature);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_execution_is_rejected() {
        let cluster = ScriptedCluster::new(
            vec![Some(Landing::Failed("insufficient funds".into()))],
            10,
        );

        let result = reconcile(
            &cluster,
            &Signature::new_unique(),
            &Hash::new_unique(),
            policy(),
            LedgerError::Timeout(60),
        )
        .await;

        assert!(matches!(result, Err(LedgerError::Rejected(ref r)) if r == "insufficient funds"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracking_limit() {
        let statuses = vec![None; 200];
        let cluster = ScriptedCluster::new(statuses, u32::MAX);

        let result = reconcile(
            &cluster,
            &Signature::new_unique(),
            &Hash::new_unique(),
            policy(),
            LedgerError::Rpc("send failed".into()),
        )
        .await;

        assert!(matches!(result, Err(LedgerError::Rpc(_))));
        // 120s limit at a 2s cadence
        assert_eq!(cluster.status_reads.load(Ordering::SeqCst), 61);
    }
}
