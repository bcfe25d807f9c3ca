//! Token giveaway runner.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │   social     │──▶│  selection   │──▶│  selection   │──▶│ disbursement │
//!   │  comments    │   │   dedup      │   │   winners    │   │  processor   │
//!   └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                   │
//!                      ┌──────────────┐   ┌──────────────┐          │
//!                      │   social     │◀──│ coordinator  │◀─────────┘
//!                      │   replies    │   │   + ledger   │
//!                      └──────────────┘   └──────────────┘
//!
//!   Cross-cutting: config, observability (logs, metrics, activity log), resilience
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use token_giveaway::config::{
    apply_env_overrides, read_config, validate_config, ConfigError, GiveawayConfig,
};
use token_giveaway::observability::{logging, metrics, EventKind};
use token_giveaway::social::AyrshareClient;
use token_giveaway::{Giveaway, GiveawayContext};

#[derive(Parser)]
#[command(name = "token-giveaway")]
#[command(about = "Reward commenters of a video with tokens", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video whose comments are read (overrides TIKTOK_VIDEO_ID).
    #[arg(long)]
    video_id: Option<String>,

    /// Number of winners (overrides NUMBER_OF_WINNERS).
    #[arg(short, long)]
    winners: Option<usize>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,

    /// Keep the activity log in this JSON file, rewritten after every event.
    #[arg(long)]
    activity_log: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut GiveawayConfig) {
        if let Some(video_id) = &self.video_id {
            config.giveaway.video_id = video_id.clone();
        }
        if let Some(winners) = self.winners {
            config.giveaway.winner_count = winners;
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }
        if let Some(path) = &self.activity_log {
            config.observability.activity_log_path = Some(path.clone());
        }
    }
}

fn load(cli: &Cli) -> Result<GiveawayConfig, ConfigError> {
    let mut config = read_config(cli.config.as_deref())?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        video_id = %config.giveaway.video_id,
        keyword = %config.giveaway.keyword,
        winners = config.giveaway.winner_count,
        token_amount = config.giveaway.token_amount,
        "Configuration loaded"
    );

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    let social = Arc::new(AyrshareClient::new(&config.social, &config.giveaway.video_id)?);
    let ledger = build_ledger(&config)?;

    let ctx = GiveawayContext::new(config)?;
    ctx.activity
        .record(EventKind::Init, "Starting giveaway", None);

    let giveaway = Giveaway::new(ctx, social.clone(), social, ledger);
    let summary = giveaway.run().await;

    tracing::info!(
        winners = summary.winners.len(),
        errors = summary.errors.len(),
        "Giveaway complete"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(feature = "solana")]
fn build_ledger(
    config: &GiveawayConfig,
) -> Result<Arc<dyn token_giveaway::blockchain::Ledger>, Box<dyn std::error::Error>> {
    let ledger = token_giveaway::blockchain::SolanaLedger::new(&config.ledger)?;
    Ok(Arc::new(ledger))
}

#[cfg(not(feature = "solana"))]
fn build_ledger(
    _config: &GiveawayConfig,
) -> Result<Arc<dyn token_giveaway::blockchain::Ledger>, Box<dyn std::error::Error>> {
    Err("built without the `solana` feature; no ledger available".into())
}
