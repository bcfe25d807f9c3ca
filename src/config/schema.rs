//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a giveaway run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GiveawayConfig {
    /// What is being given away and to how many people.
    pub giveaway: CampaignConfig,

    /// Comment source and reply API.
    pub social: SocialConfig,

    /// Ledger endpoint, signer and token.
    pub ledger: LedgerConfig,

    /// Inner retry envelope around a single disbursement.
    pub disbursement: DisbursementConfig,

    /// Outer retry envelope around a whole winner.
    pub winner_retry: WinnerRetryConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// A credential that must never end up in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw value for the one place that needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// Campaign parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Video whose comments are read.
    pub video_id: String,

    /// Keyword a comment must contain (case-insensitive).
    pub keyword: String,

    /// Whole tokens sent to each winner.
    pub token_amount: u64,

    /// Decimal places of the token mint.
    pub token_decimals: u32,

    /// Number of winners to draw.
    pub winner_count: usize,

    /// Reply posted under a winning comment. `{signature}` is substituted.
    pub reply_template: String,
}

impl CampaignConfig {
    /// Amount per winner in the token's base units, `None` on overflow.
    pub fn base_units(&self) -> Option<u64> {
        10u64
            .checked_pow(self.token_decimals)
            .and_then(|scale| self.token_amount.checked_mul(scale))
    }

    /// Render the winner reply for a transfer signature.
    pub fn reply_for(&self, signature: &str) -> String {
        self.reply_template.replace("{signature}", signature)
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            video_id: String::new(),
            keyword: "pencil".to_string(),
            token_amount: 30_000,
            token_decimals: 6,
            winner_count: 2,
            reply_template: "You won! Tx: {signature}".to_string(),
        }
    }
}

/// Social API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocialConfig {
    /// Base URL of the comments API.
    pub api_base_url: String,

    /// Bearer token for the comments API.
    pub api_key: Secret,

    /// Platform name passed to the API and used as the response key.
    pub platform: String,

    /// Per-request timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.ayrshare.com/api".to_string(),
            api_key: Secret::default(),
            platform: "tiktok".to_string(),
            http_timeout_secs: 30,
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Base-58 encoded secret key of the paying wallet.
    pub signer_secret: Secret,

    /// Mint of the token being given away.
    pub token_mint: String,

    /// Upper bound on a single submit-and-confirm call, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Interval between signature status checks of an unconfirmed transaction.
    pub status_poll_ms: u64,

    /// How long an unconfirmed transaction is tracked before giving up, in seconds.
    pub reconcile_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            signer_secret: Secret::default(),
            token_mint: String::new(),
            confirmation_timeout_secs: 60,
            status_poll_ms: 2000,
            reconcile_timeout_secs: 120,
        }
    }
}

/// Retry policy of the transfer coordinator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisbursementConfig {
    /// Ledger attempts per `disburse` call.
    pub max_attempts: u32,

    /// Base of the exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: u64,

    /// Pause after a freshly created token account is confirmed.
    pub account_settle_ms: u64,
}

impl Default for DisbursementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            account_settle_ms: 2000,
        }
    }
}

/// Retry policy of the winner processing loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WinnerRetryConfig {
    /// Passes over a single winner before giving up.
    pub max_attempts: u32,

    /// Linear delay step in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for WinnerRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step_delay_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,

    /// JSON file rewritten with the run summary after every activity event.
    pub activity_log_path: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "token_giveaway=info".to_string(),
            json_logs: false,
            metrics_address: None,
            activity_log_path: None,
        }
    }
}
