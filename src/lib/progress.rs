//! Progress tracking for region merging.
//!
//! Regions complete on the worker pool in any order, but they are merged one at a time on the
//! consumer thread, so progress is reported in merge order: a message every `interval` regions
//! and a final one when the chromosome is done.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::format_count;

/// Thread-safe counter of merged regions that logs at regular intervals.
///
/// # Example
/// ```
/// use fgvar_lib::progress::RegionProgress;
///
/// let progress = RegionProgress::new("chr1", 250).with_interval(100);
/// for _ in 0..250 {
///     progress.record(3); // Logs at 100 and 200 regions
/// }
/// progress.log_final(); // Logs "Merged 250/250 regions on chr1 (750 variants) (complete)"
/// assert_eq!(progress.regions(), 250);
/// ```
#[derive(Debug)]
pub struct RegionProgress {
    /// Chromosome being merged, used as the message suffix.
    chromosome: String,
    /// Total number of regions expected.
    total: u64,
    /// Regions between progress messages.
    interval: u64,
    /// Regions merged so far.
    regions: AtomicU64,
    /// Variants received from merged regions so far.
    variants: AtomicU64,
}

impl RegionProgress {
    /// Create a tracker for `total` regions on `chromosome`, logging every 1,000 regions.
    #[must_use]
    pub fn new(chromosome: impl Into<String>, total: usize) -> Self {
        Self {
            chromosome: chromosome.into(),
            total: total as u64,
            interval: 1_000,
            regions: AtomicU64::new(0),
            variants: AtomicU64::new(0),
        }
    }

    /// Set the logging interval (at least 1).
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Record one merged region carrying `variants` calls, logging on interval boundaries.
    ///
    /// Returns `true` if a message was logged.
    pub fn record(&self, variants: usize) -> bool {
        let total_variants =
            self.variants.fetch_add(variants as u64, Ordering::Relaxed) + variants as u64;
        let merged = self.regions.fetch_add(1, Ordering::Relaxed) + 1;
        if merged.is_multiple_of(self.interval) {
            info!("{}", self.message(merged, total_variants));
            true
        } else {
            false
        }
    }

    /// Log the final count unless the last `record` already did.
    pub fn log_final(&self) {
        let merged = self.regions();
        if merged > 0 && !merged.is_multiple_of(self.interval) {
            info!("{} (complete)", self.message(merged, self.variants()));
        }
    }

    /// Regions merged so far.
    #[must_use]
    pub fn regions(&self) -> u64 {
        self.regions.load(Ordering::Relaxed)
    }

    /// Variants received so far.
    #[must_use]
    pub fn variants(&self) -> u64 {
        self.variants.load(Ordering::Relaxed)
    }

    fn message(&self, merged: u64, variants: u64) -> String {
        format!(
            "Merged {}/{} regions on {} ({} variants)",
            format_count(merged),
            format_count(self.total),
            self.chromosome,
            format_count(variants)
        )
    }
}
