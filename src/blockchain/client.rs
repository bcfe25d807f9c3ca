//! Solana RPC ledger with timeout and error handling.
//!
//! # Responsibilities
//! - Resolve associated token accounts for the configured mint
//! - Create missing recipient accounts (idempotent instruction)
//! - Sign, broadcast and confirm SPL token transfers
//! - Bound every RPC call with the configured timeout
//! - Settle a transfer whose confirmation was lost before reporting failure

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use tokio::time::timeout;

use crate::blockchain::confirmation::{self, Landing, ReconcilePolicy, SignatureTracker};
use crate::blockchain::types::{Ledger, LedgerError, LedgerResult, TokenAccount, TxSignature};
use crate::blockchain::wallet::keypair_from_secret;
use crate::config::LedgerConfig;
use crate::selection::WalletAddress;

/// SPL token ledger backed by a Solana JSON-RPC endpoint.
#[derive(Clone)]
pub struct SolanaLedger {
    rpc: Arc<RpcClient>,
    payer: Arc<Keypair>,
    mint: Pubkey,
    /// Paying wallet's token account for `mint`.
    source: Pubkey,
    timeout_duration: Duration,
    reconcile_policy: ReconcilePolicy,
    rpc_url: String,
}

impl SolanaLedger {
    /// Create a ledger client. No network traffic happens here.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let payer = keypair_from_secret(&config.signer_secret)?;
        let mint = parse_pubkey(&config.token_mint)?;
        let source = get_associated_token_address(&payer.pubkey(), &mint);

        let rpc = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            CommitmentConfig::confirmed(),
        );

        tracing::info!(
            rpc_url = %config.rpc_url,
            mint = %mint,
            source = %source,
            "Ledger client initialized"
        );

        Ok(Self {
            rpc: Arc::new(rpc),
            payer: Arc::new(payer),
            mint,
            source,
            timeout_duration: Duration::from_secs(config.confirmation_timeout_secs),
            reconcile_policy: ReconcilePolicy {
                poll_interval: Duration::from_millis(config.status_poll_ms),
                limit: Duration::from_secs(config.reconcile_timeout_secs),
            },
            rpc_url: config.rpc_url.clone(),
        })
    }

    async fn call<T, F>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(LedgerError::Rpc(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Sign a single instruction with the paying wallet and wait for confirmation.
    ///
    /// A failed or timed-out confirmation does not prove the transaction was
    /// dropped, so its signature is tracked until it lands or its blockhash
    /// expires.
    async fn send(&self, instruction: Instruction) -> LedgerResult<Signature> {
        let blockhash = self.call(self.rpc.get_latest_blockhash()).await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[self.payer.as_ref()],
            blockhash,
        );
        let signature = transaction.signatures[0];

        let cause = match timeout(
            self.timeout_duration,
            self.rpc.send_and_confirm_transaction(&transaction),
        )
        .await
        {
            Ok(Ok(confirmed)) => return Ok(confirmed),
            Ok(Err(e)) if definitely_failed(&e) => {
                return Err(LedgerError::Rejected(e.to_string()))
            }
            Ok(Err(e)) => LedgerError::Rpc(e.to_string()),
            Err(_) => LedgerError::Timeout(self.timeout_duration.as_secs()),
        };

        tracing::warn!(%signature, error = %cause, "Confirmation lost, checking signature status");
        confirmation::reconcile(self, &signature, &blockhash, self.reconcile_policy, cause).await
    }

    fn associated_account(&self, owner: &WalletAddress) -> LedgerResult<Pubkey> {
        let owner = parse_pubkey(owner.as_str())?;
        Ok(get_associated_token_address(&owner, &self.mint))
    }
}

fn parse_pubkey(value: &str) -> LedgerResult<Pubkey> {
    Pubkey::from_str(value).map_err(|e| LedgerError::InvalidAddress(format!("{}: {}", value, e)))
}

/// Errors after which the transaction certainly moved no tokens.
fn definitely_failed(e: &ClientError) -> bool {
    matches!(
        e.kind(),
        ClientErrorKind::TransactionError(_)
            | ClientErrorKind::RpcError(RpcError::RpcResponseError {
                data: RpcResponseErrorData::SendTransactionPreflightFailure(_),
                ..
            })
    )
}

#[async_trait]
impl SignatureTracker for SolanaLedger {
    async fn landing(&self, signature: &Signature) -> LedgerResult<Landing> {
        let response = self.call(self.rpc.get_signature_statuses(&[*signature])).await?;

        Ok(match response.value.into_iter().next().flatten() {
            Some(status) => {
                let confirmed = status.satisfies_commitment(CommitmentConfig::confirmed());
                match status.err {
                    Some(err) => Landing::Failed(err.to_string()),
                    None if confirmed => Landing::Confirmed,
                    None => Landing::Processing,
                }
            }
            None => Landing::Unknown,
        })
    }

    async fn blockhash_valid(&self, blockhash: &Hash) -> LedgerResult<bool> {
        self.call(
            self.rpc
                .is_blockhash_valid(blockhash, CommitmentConfig::processed()),
        )
        .await
    }
}

#[async_trait]
impl Ledger for SolanaLedger {
    async fn find_token_account(&self, owner: &WalletAddress) -> LedgerResult<Option<TokenAccount>> {
        let account = self.associated_account(owner)?;
        let response = self
            .call(
                self.rpc
                    .get_account_with_commitment(&account, CommitmentConfig::confirmed()),
            )
            .await?;

        Ok(response.value.map(|_| TokenAccount(account.to_string())))
    }

    async fn create_token_account(&self, owner: &WalletAddress) -> LedgerResult<TokenAccount> {
        let owner_key = parse_pubkey(owner.as_str())?;
        let account = get_associated_token_address(&owner_key, &self.mint);
        let instruction = create_associated_token_account_idempotent(
            &self.payer.pubkey(),
            &owner_key,
            &self.mint,
            &spl_token::id(),
        );

        let signature = self.send(instruction).await?;
        tracing::debug!(owner = %owner, account = %account, %signature, "Token account created");
        Ok(TokenAccount(account.to_string()))
    }

    async fn transfer(&self, destination: &TokenAccount, amount: u64) -> LedgerResult<TxSignature> {
        let destination = parse_pubkey(destination.as_str())?;
        let instruction = spl_token::instruction::transfer(
            &spl_token::id(),
            &self.source,
            &destination,
            &self.payer.pubkey(),
            &[],
            amount,
        )
        .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let signature = self.send(instruction).await?;
        Ok(TxSignature(signature.to_string()))
    }
}

impl std::fmt::Debug for SolanaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaLedger")
            .field("rpc_url", &self.rpc_url)
            .field("payer", &self.payer.pubkey())
            .field("mint", &self.mint)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    fn test_config() -> LedgerConfig {
        let payer = Keypair::new();
        LedgerConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            signer_secret: Secret::new(bs58::encode(payer.to_bytes()).into_string()),
            token_mint: Pubkey::new_unique().to_string(),
            confirmation_timeout_secs: 2,
            ..LedgerConfig::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let ledger = SolanaLedger::new(&test_config()).unwrap();
        let debug = format!("{:?}", ledger);
        assert!(debug.contains("127.0.0.1:1"));
    }

    #[test]
    fn test_invalid_mint() {
        let mut config = test_config();
        config.token_mint = "not-a-mint".to_string();
        let err = SolanaLedger::new(&config).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_an_error() {
        let ledger = SolanaLedger::new(&test_config()).unwrap();
        let owner: WalletAddress = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".parse().unwrap();
        let result = ledger.find_token_account(&owner).await;
        assert!(matches!(
            result,
            Err(LedgerError::Rpc(_)) | Err(LedgerError::Timeout(_))
        ));
    }
}
