//! Sequential winner processing.
//!
//! Winners are handled one at a time. Each winner gets an outer retry
//! envelope around disburse + notify that is independent of the
//! coordinator's own attempts.

use std::sync::Arc;

use serde_json::json;
use tokio::time::sleep;

use crate::config::{CampaignConfig, WinnerRetryConfig};
use crate::context::GiveawayContext;
use crate::disbursement::coordinator::TransferCoordinator;
use crate::observability::{metrics, ActivityLog, EventKind};
use crate::resilience::linear_backoff;
use crate::selection::{PaidWinner, Winner};
use crate::social::Notifier;

/// What happened to the drawn winners.
#[derive(Debug, Clone, Default)]
pub struct ProcessingReport {
    pub paid: Vec<PaidWinner>,
    pub failed: Vec<Winner>,
}

/// Disburses to winners and notifies them.
pub struct WinnerProcessor {
    coordinator: TransferCoordinator,
    notifier: Arc<dyn Notifier>,
    activity: Arc<ActivityLog>,
    campaign: CampaignConfig,
    policy: WinnerRetryConfig,
}

impl WinnerProcessor {
    pub fn new(
        ctx: &GiveawayContext,
        coordinator: TransferCoordinator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            coordinator,
            notifier,
            activity: ctx.activity.clone(),
            campaign: ctx.config.giveaway.clone(),
            policy: ctx.config.winner_retry.clone(),
        }
    }

    /// Process every winner in order. One failure never stops the others.
    pub async fn process_all(&self, winners: Vec<Winner>) -> ProcessingReport {
        let mut report = ProcessingReport::default();

        for winner in winners {
            match self.process_with_retry(&winner).await {
                Some(paid) => {
                    metrics::record_winner("paid");
                    self.activity.push_winner(paid.clone());
                    report.paid.push(paid);
                }
                None => {
                    metrics::record_winner("failed");
                    self.activity.record(
                        EventKind::Error,
                        format!("Failed to process winner {} after all attempts", winner.author),
                        Some(json!({ "address": winner.address })),
                    );
                    report.failed.push(winner);
                }
            }
        }

        report
    }

    async fn process_with_retry(&self, winner: &Winner) -> Option<PaidWinner> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            if let Some(paid) = self.process_once(winner).await {
                return Some(paid);
            }

            if attempt < max_attempts {
                let delay = linear_backoff(attempt, self.policy.step_delay_ms);
                self.activity.record(
                    EventKind::Retry,
                    format!(
                        "Waiting {}ms before retrying winner processing",
                        delay.as_millis()
                    ),
                    None,
                );
                sleep(delay).await;
            }
        }

        None
    }

    /// Disburse, then notify on success.
    async fn process_once(&self, winner: &Winner) -> Option<PaidWinner> {
        self.activity.record(
            EventKind::Processing,
            format!("Processing winner {}", winner.author),
            Some(json!({ "address": winner.address })),
        );

        let outcome = self.coordinator.disburse(&winner.address).await;
        let signature = outcome.signature()?.to_string();

        self.notify(winner, &signature).await;
        Some(PaidWinner::new(winner.clone(), signature))
    }

    async fn notify(&self, winner: &Winner, signature: &str) {
        self.activity.record(
            EventKind::Reply,
            "Sending winner notification",
            Some(json!({ "username": winner.author, "address": winner.address })),
        );

        let message = self.campaign.reply_for(signature);
        match self.notifier.notify(&winner.comment_id, &message).await {
            Ok(()) => {
                metrics::record_notification("sent");
                self.activity
                    .record(EventKind::Reply, "Winner notification sent", None);
            }
            Err(e) => {
                metrics::record_notification("failed");
                self.activity.record(
                    EventKind::Error,
                    "Failed to send notification, but tokens were sent",
                    Some(json!(e.to_string())),
                );
            }
        }
    }
}
