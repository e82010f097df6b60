//! Metrics collection.
//!
//! # Metrics
//! - `icon_cache_hits_total` (counter): requests served by an existing entry
//! - `icon_cache_misses_total` (counter): requests that started a fetch chain
//! - `icon_fetch_attempts_total` (counter): per-host attempts by `host`, `outcome`
//! - `icon_resolve_exhausted_total` (counter): chains that ran out of hosts
//! - `icon_cache_entries` (gauge): entries in the active cache
//!
//! # Design Decisions
//! - Thin wrappers so call sites never spell metric names
//! - Labels are limited to host and outcome to keep cardinality bounded

use metrics::{counter, gauge};

pub fn record_cache_hit() {
    counter!("icon_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("icon_cache_misses_total").increment(1);
}

/// One host attempt; `outcome` is `"ok"` or the failure kind.
pub fn record_fetch_attempt(host: &str, outcome: &'static str) {
    counter!(
        "icon_fetch_attempts_total",
        "host" => host.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_exhausted() {
    counter!("icon_resolve_exhausted_total").increment(1);
}

pub fn record_cache_entries(entries: usize) {
    gauge!("icon_cache_entries").set(entries as f64);
}
