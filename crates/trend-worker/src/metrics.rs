//! Pipeline metrics collection.
//!
//! Counters for fallback tier usage, copy degradation and placeholder
//! backgrounds, plus a run latency histogram. Nothing is recorded unless the
//! binary installs a recorder.

use metrics::{counter, histogram};
use trend_models::{Category, CopyLanguage};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Tier that produced the selected candidate, by category and tier.
    pub const TIER_USED_TOTAL: &str = "poster_tier_used_total";

    /// Tiers that failed or returned nothing, by category and tier.
    pub const TIER_FAILED_TOTAL: &str = "poster_tier_failed_total";

    /// Copy blocks replaced by a template, by category and language.
    pub const COPY_DEGRADED_TOTAL: &str = "poster_copy_degraded_total";

    /// Runs that fell back to a synthesized background.
    pub const PLACEHOLDER_TOTAL: &str = "poster_placeholder_total";

    /// Finished runs by category and status.
    pub const RUNS_TOTAL: &str = "poster_runs_total";

    /// Run duration in seconds by category.
    pub const RUN_SECONDS: &str = "poster_run_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

pub fn record_tier_used(category: Category, tier: &'static str) {
    counter!(
        names::TIER_USED_TOTAL,
        "category" => category.as_str(),
        "tier" => tier
    )
    .increment(1);
}

pub fn record_tier_failed(category: Category, tier: &'static str) {
    counter!(
        names::TIER_FAILED_TOTAL,
        "category" => category.as_str(),
        "tier" => tier
    )
    .increment(1);
}

pub fn record_copy_degraded(category: Category, language: CopyLanguage) {
    counter!(
        names::COPY_DEGRADED_TOTAL,
        "category" => category.as_str(),
        "language" => language.as_str()
    )
    .increment(1);
}

pub fn record_placeholder(category: Category) {
    counter!(names::PLACEHOLDER_TOTAL, "category" => category.as_str()).increment(1);
}

/// Record a finished run. `status` is `"ok"` or `"exhausted"`.
pub fn record_run(category: Category, status: &'static str, seconds: f64) {
    counter!(
        names::RUNS_TOTAL,
        "category" => category.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!(names::RUN_SECONDS, "category" => category.as_str()).record(seconds);
}
