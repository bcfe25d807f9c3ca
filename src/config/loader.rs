//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{GiveawayConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {var} is invalid: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then process environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GiveawayConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse the TOML file at `path`, or defaults when there is none. Not validated.
pub fn read_config(path: Option<&Path>) -> Result<GiveawayConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(GiveawayConfig::default()),
    }
}

/// Overlay environment-style settings on top of a parsed config.
///
/// `lookup` returns the value of a variable if it is set.
pub fn apply_env_overrides<F>(config: &mut GiveawayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("TIKTOK_API_KEY") {
        config.social.api_key = Secret::new(v);
    }
    if let Some(v) = lookup("TIKTOK_VIDEO_ID") {
        config.giveaway.video_id = v;
    }
    if let Some(v) = lookup("SEARCH_PHRASE") {
        config.giveaway.keyword = v;
    }
    if let Some(v) = lookup("LEA_TO_SEND") {
        config.giveaway.token_amount = parse_var("LEA_TO_SEND", &v)?;
    }
    if let Some(v) = lookup("NUMBER_OF_WINNERS") {
        config.giveaway.winner_count = parse_var("NUMBER_OF_WINNERS", &v)?;
    }
    if let Some(v) = lookup("SOLANA_PRIVATE_KEY") {
        config.ledger.signer_secret = Secret::new(v);
    }
    if let Some(v) = lookup("TOKEN_MINT_ADDRESS") {
        config.ledger.token_mint = v;
    }
    if let Some(v) = lookup("SOLANA_RPC_URL") {
        config.ledger.rpc_url = v;
    }
    if let Some(v) = lookup("ACTIVITY_LOG_PATH") {
        config.observability.activity_log_path = Some(v.into());
    }
    Ok(())
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
    })
}
