//! Backoff schedules for the two retry envelopes.

use std::time::Duration;

/// Capped exponential delay after the given 1-based failed attempt.
///
/// `attempt = 1` waits `base_ms * 2`, `attempt = 2` waits `base_ms * 4`, and
/// so on until `max_ms` is reached.
pub fn exponential_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponential = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(exponential);

    Duration::from_millis(delay_ms.min(max_ms))
}

/// Linearly increasing delay: `step_ms * attempt`.
pub fn linear_backoff(attempt: u32, step_ms: u64) -> Duration {
    Duration::from_millis(step_ms.saturating_mul(attempt as u64))
}
