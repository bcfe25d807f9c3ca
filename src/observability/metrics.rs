//! Metrics collection and exposition.
//!
//! # Metrics
//! - `giveaway_comments_total` (counter): comments fetched
//! - `giveaway_participants` (gauge): participants after deduplication
//! - `giveaway_duplicate_wallets` (gauge): wallets claimed by several authors
//! - `giveaway_transfer_attempts_total` (counter): ledger attempts by result
//! - `giveaway_winners_total` (counter): processed winners by outcome
//! - `giveaway_notifications_total` (counter): winner replies by result

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_comments(count: usize) {
    metrics::counter!("giveaway_comments_total").increment(count as u64);
}

pub fn record_participants(participants: usize, duplicate_wallets: usize) {
    metrics::gauge!("giveaway_participants").set(participants as f64);
    metrics::gauge!("giveaway_duplicate_wallets").set(duplicate_wallets as f64);
}

pub fn record_transfer_attempt(result: &'static str) {
    metrics::counter!("giveaway_transfer_attempts_total", "result" => result).increment(1);
}

pub fn record_winner(outcome: &'static str) {
    metrics::counter!("giveaway_winners_total", "outcome" => outcome).increment(1);
}

pub fn record_notification(result: &'static str) {
    metrics::counter!("giveaway_notifications_total", "result" => result).increment(1);
}
