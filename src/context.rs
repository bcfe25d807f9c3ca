//! Run context shared by every component.

use std::sync::Arc;

use crate::config::validation::ValidationError;
use crate::config::{ConfigError, GiveawayConfig};
use crate::disbursement::TransferTable;
use crate::observability::ActivityLog;

/// Configuration, activity log and transfer-state table of one run.
///
/// Cloning is cheap; clones share the same log and table.
#[derive(Debug, Clone)]
pub struct GiveawayContext {
    pub config: Arc<GiveawayConfig>,
    pub activity: Arc<ActivityLog>,
    pub transfers: TransferTable,
    base_units: u64,
}

impl GiveawayContext {
    pub fn new(config: GiveawayConfig) -> Result<Self, ConfigError> {
        let base_units = config.giveaway.base_units().ok_or_else(|| {
            ConfigError::Validation(vec![ValidationError::AmountOverflow {
                amount: config.giveaway.token_amount,
                decimals: config.giveaway.token_decimals,
            }])
        })?;

        let mut activity = ActivityLog::new(&config.giveaway.video_id, &config.giveaway.keyword);
        if let Some(path) = &config.observability.activity_log_path {
            activity = activity.persist_to(path);
        }

        Ok(Self {
            config: Arc::new(config),
            activity: Arc::new(activity),
            transfers: TransferTable::new(),
            base_units,
        })
    }

    /// Amount per winner in the token's base units.
    pub fn base_units(&self) -> u64 {
        self.base_units
    }
}
