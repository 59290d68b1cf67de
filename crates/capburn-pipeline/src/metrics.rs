//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const STEP_DURATION_SECONDS: &str = "capburn_pipeline_step_duration_seconds";
    pub const RENDERS_TOTAL: &str = "capburn_renders_total";
    pub const RENDER_DURATION_SECONDS: &str = "capburn_render_duration_seconds";
    pub const WATERMARK_MODE_TOTAL: &str = "capburn_watermark_mode_total";
    pub const DEGRADATIONS_TOTAL: &str = "capburn_degradations_total";
}

/// Record how long one pipeline step took.
pub fn record_step_duration(step: &str, duration_secs: f64) {
    let labels = [("step", step.to_string())];
    histogram!(names::STEP_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished render. `outcome` is "success" or an error kind.
pub fn record_render(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_watermark_mode(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::WATERMARK_MODE_TOTAL, &labels).increment(1);
}

/// Record a non-fatal fallback (probe or watermark).
pub fn record_degradation(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::DEGRADATIONS_TOTAL, &labels).increment(1);
}
