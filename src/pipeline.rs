//! End-to-end giveaway run.
//!
//! ```text
//! CommentSource → ParticipantDeduplicator → select_winners
//!     → WinnerProcessor (TransferCoordinator + Notifier) → RunSummary
//! ```

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::blockchain::Ledger;
use crate::context::GiveawayContext;
use crate::disbursement::{ProcessingReport, TransferCoordinator, WinnerProcessor};
use crate::observability::{metrics, EventKind, RunSummary};
use crate::selection::dedup::Admission;
use crate::selection::{select_winners, ParticipantDeduplicator, Winner};
use crate::social::{Comment, CommentSource, Notifier};

/// A giveaway wired to its collaborators.
pub struct Giveaway {
    ctx: GiveawayContext,
    source: Arc<dyn CommentSource>,
    processor: WinnerProcessor,
}

impl Giveaway {
    pub fn new(
        ctx: GiveawayContext,
        source: Arc<dyn CommentSource>,
        notifier: Arc<dyn Notifier>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        let coordinator = TransferCoordinator::new(&ctx, ledger);
        let processor = WinnerProcessor::new(&ctx, coordinator, notifier);
        Self {
            ctx,
            source,
            processor,
        }
    }

    pub fn context(&self) -> &GiveawayContext {
        &self.ctx
    }

    /// Run with an OS-seeded random generator.
    pub async fn run(&self) -> RunSummary {
        let mut rng = StdRng::from_entropy();
        self.run_with_rng(&mut rng).await
    }

    /// Run the whole pipeline. Never fails; problems end up in the summary.
    pub async fn run_with_rng<R>(&self, rng: &mut R) -> RunSummary
    where
        R: Rng + ?Sized,
    {
        let activity = &self.ctx.activity;
        activity.record(
            EventKind::Start,
            "Starting comment verification and winner selection",
            None,
        );

        let comments = self.fetch_comments().await;
        if !comments.is_empty() {
            let winners = self.draw(&comments, rng);
            let report = self.processor.process_all(winners).await;
            log_report(&self.ctx, &report);
        }

        activity.record(EventKind::Complete, "Processing completed", None);
        activity.summary()
    }

    /// Fetch comments, degrading to none when the source is unavailable.
    async fn fetch_comments(&self) -> Vec<Comment> {
        let activity = &self.ctx.activity;
        let video_id = &self.ctx.config.giveaway.video_id;

        activity.record(
            EventKind::Fetch,
            "Fetching comments for video",
            Some(json!({ "video_id": video_id })),
        );

        let comments = match self.source.fetch_comments(video_id).await {
            Ok(comments) => comments,
            Err(e) => {
                activity.record(
                    EventKind::Error,
                    "Error while fetching comments",
                    Some(json!(e.to_string())),
                );
                return Vec::new();
            }
        };

        if comments.is_empty() {
            activity.record(EventKind::Fetch, "No comments found", None);
        } else {
            activity.record(
                EventKind::Fetch,
                format!("Received {} comments", comments.len()),
                None,
            );
        }
        metrics::record_comments(comments.len());
        comments
    }

    /// Deduplicate participants and draw the winners.
    fn draw<R>(&self, comments: &[Comment], rng: &mut R) -> Vec<Winner>
    where
        R: Rng + ?Sized,
    {
        let activity = &self.ctx.activity;
        let mut dedup = ParticipantDeduplicator::new(&self.ctx.config.giveaway.keyword);

        for comment in comments {
            match dedup.push(comment) {
                Admission::Ignored => {}
                Admission::Contested { address, evicted } => {
                    activity.record(
                        EventKind::Duplicate,
                        "Wallet used multiple times",
                        Some(json!({
                            "wallet": address,
                            "previousUser": evicted,
                            "currentUser": comment.author(),
                        })),
                    );
                }
                Admission::Bound { address }
                | Admission::Replaced { address, .. }
                | Admission::Stale { address } => {
                    activity.record(
                        EventKind::Validation,
                        "Found exactly one valid address",
                        Some(json!({ "author": comment.author(), "address": address })),
                    );
                }
            }
        }

        let result = dedup.finish();
        metrics::record_participants(
            result.statistics.unique_participants,
            result.statistics.duplicate_wallets,
        );
        activity.set_statistics(result.statistics);

        let winners = select_winners(
            result.participants,
            self.ctx.config.giveaway.winner_count,
            rng,
        );
        activity.record(
            EventKind::Winners,
            format!("Selected {} winners", winners.len()),
            Some(json!(winners)),
        );
        winners
    }
}

fn log_report(ctx: &GiveawayContext, report: &ProcessingReport) {
    tracing::info!(
        run_id = %ctx.activity.run_id(),
        paid = report.paid.len(),
        failed = report.failed.len(),
        "Winner processing finished"
    );
}
