//! Delay between failover attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::schema::FailoverConfig;

/// Fixed failover delay plus optional jitter.
///
/// Jitter is drawn from `0..delay_ms * jitter_ratio`; with the default ratio
/// of 0 the delay is exactly `delay_ms`.
pub fn failover_delay(config: &FailoverConfig) -> Duration {
    let base_ms = config.delay_ms;
    let ratio = config.jitter_ratio.clamp(0.0, 1.0);
    let jitter_range = (base_ms as f64 * ratio) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(base_ms.saturating_add(jitter))
}
