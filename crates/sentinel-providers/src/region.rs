//! Deployment region validation.

use tracing::warn;

/// Region used when the configured one is not recognized.
pub const DEFAULT_REGION: &str = "us-central1";

/// Regions the Gemini backend can be pinned to.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "us-central1",
    "us-east1",
    "us-east4",
    "us-west1",
    "us-west4",
    "europe-west1",
    "europe-west2",
    "europe-west4",
    "asia-northeast1",
    "asia-southeast1",
];

/// Returns the region unchanged when supported, otherwise logs a warning
/// and falls back to [`DEFAULT_REGION`]. A bad region degrades to the
/// default rather than failing startup.
#[must_use]
pub fn normalize_region(region: &str) -> &str {
    if SUPPORTED_REGIONS.contains(&region) {
        region
    } else {
        warn!(
            region,
            fallback = DEFAULT_REGION,
            "unsupported region; falling back to default"
        );
        DEFAULT_REGION
    }
}
