//! Paying wallet loading.
//!
//! # Security
//! - The secret comes from configuration or `SOLANA_PRIVATE_KEY`
//! - Only the public key is ever logged

use solana_sdk::signature::{Keypair, Signer};

use crate::blockchain::types::{LedgerError, LedgerResult};
use crate::config::Secret;

/// Parse a signing keypair.
///
/// Accepts the base-58 export format of browser wallets or the JSON byte
/// array written by `solana-keygen`.
pub fn keypair_from_secret(secret: &Secret) -> LedgerResult<Keypair> {
    let raw = secret.expose().trim();

    let bytes: Vec<u8> = if raw.starts_with('[') {
        serde_json::from_str(raw)
            .map_err(|e| LedgerError::Wallet(format!("Invalid keypair JSON: {}", e)))?
    } else {
        bs58::decode(raw)
            .into_vec()
            .map_err(|e| LedgerError::Wallet(format!("Invalid base-58 secret: {}", e)))?
    };

    let keypair = Keypair::from_bytes(&bytes)
        .map_err(|e| LedgerError::Wallet(format!("Invalid private key: {}", e)))?;

    tracing::info!(address = %keypair.pubkey(), "Wallet initialized");
    Ok(keypair)
}
