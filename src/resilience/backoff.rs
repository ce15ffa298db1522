//! Exponential backoff with additive jitter.

use std::time::Duration;

use rand::Rng;

/// Calculate the delay to wait after failed attempt `attempt` (1-indexed):
/// `base_ms * 2^(attempt-1)` plus a uniform jitter in `[0, jitter_ms)`.
pub fn calculate_backoff<R: Rng + ?Sized>(
    attempt: u32,
    base_ms: u64,
    jitter_ms: u64,
    rng: &mut R,
) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    let jitter = if jitter_ms > 0 {
        rng.gen_range(0..jitter_ms)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter))
}
