//! Enhanced logging utilities for formatted output.
//!
//! Consistent, user-friendly formatting of counts, durations and rates, plus the end-of-run
//! pipeline summary.

use std::time::{Duration, Instant};

use crate::pipeline::ChromosomeSummary;

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use fgvar_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a percentage with specified decimal places.
///
/// # Examples
///
/// ```
/// use fgvar_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form.
///
/// # Examples
///
/// ```
/// use fgvar_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a rate (items per second) with appropriate units.
///
/// # Examples
///
/// ```
/// use fgvar_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 items/s");
/// assert_eq!(format_rate(30, Duration::from_secs(60)), "30.0 items/min");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        let items_per_min = count as f64 / (secs / 60.0);
        format!("{items_per_min:.1} items/min")
    }
}

/// Logs a summary of a pipeline run across chromosomes.
///
/// # Examples
///
/// ```no_run
/// use fgvar_lib::logging::log_pipeline_summary;
///
/// log_pipeline_summary(&[]);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn log_pipeline_summary(summaries: &[ChromosomeSummary]) {
    let regions: u64 = summaries.iter().map(|s| s.regions).sum();
    let received: u64 = summaries.iter().map(|s| s.stats.variants_received).sum();
    let merges: u64 = summaries.iter().map(|s| s.stats.merges).sum();
    let filtered: u64 = summaries.iter().map(|s| s.stats.variants_filtered).sum();
    let written: u64 = summaries.iter().map(|s| s.written).sum();

    log::info!("Phasing Summary:");
    log::info!("  Chromosomes: {}", format_count(summaries.len() as u64));
    log::info!("  Regions: {}", format_count(regions));
    log::info!("  Candidates received: {}", format_count(received));
    log::info!("  Merges performed: {}", format_count(merges));
    log::info!("  Calls filtered: {}", format_count(filtered));
    log::info!("  Calls written: {}", format_count(written));

    if received > 0 {
        log::info!("  Written/received: {}", format_percent(written as f64 / received as f64, 2));
    }
}

/// Operation timing and summary helper.
///
/// # Examples
///
/// ```no_run
/// use fgvar_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Phasing candidates");
///
/// // ... do work ...
///
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
