//! Configuration validation.
//!
//! Serde handles syntax; this module checks that the values make sense
//! together. Every problem is reported, not just the first one.

use thiserror::Error;

use crate::config::schema::GiveawayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("token amount {amount} with {decimals} decimals overflows u64")]
    AmountOverflow { amount: u64, decimals: u32 },
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GiveawayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.giveaway.video_id.trim().is_empty() {
        errors.push(ValidationError::Missing("giveaway.video_id"));
    }
    if config.giveaway.keyword.trim().is_empty() {
        errors.push(ValidationError::Missing("giveaway.keyword"));
    }
    if config.giveaway.token_amount == 0 {
        errors.push(ValidationError::Zero("giveaway.token_amount"));
    }
    if config.giveaway.base_units().is_none() {
        errors.push(ValidationError::AmountOverflow {
            amount: config.giveaway.token_amount,
            decimals: config.giveaway.token_decimals,
        });
    }

    if config.social.api_key.is_empty() {
        errors.push(ValidationError::Missing("social.api_key"));
    }
    check_url("social.api_base_url", &config.social.api_base_url, &mut errors);
    if config.social.http_timeout_secs == 0 {
        errors.push(ValidationError::Zero("social.http_timeout_secs"));
    }

    check_url("ledger.rpc_url", &config.ledger.rpc_url, &mut errors);
    if config.ledger.signer_secret.is_empty() {
        errors.push(ValidationError::Missing("ledger.signer_secret"));
    }
    if config.ledger.token_mint.trim().is_empty() {
        errors.push(ValidationError::Missing("ledger.token_mint"));
    }
    if config.ledger.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::Zero("ledger.confirmation_timeout_secs"));
    }
    if config.ledger.status_poll_ms == 0 {
        errors.push(ValidationError::Zero("ledger.status_poll_ms"));
    }

    if config.disbursement.max_attempts == 0 {
        errors.push(ValidationError::Zero("disbursement.max_attempts"));
    }
    if config.winner_retry.max_attempts == 0 {
        errors.push(ValidationError::Zero("winner_retry.max_attempts"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::InvalidUrl {
            field,
            reason: e.to_string(),
        });
    }
}
