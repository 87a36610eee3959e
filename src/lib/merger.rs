//! In-order merging of region results.
//!
//! [`OrderedMerger`] turns the futures returned by the scheduler back into one positionally
//! ordered stream. It waits on region `i` before looking at region `i + 1`, even when later
//! regions finished first, and feeds each region's calls through the [`Phaser`] and then the
//! [`InclusionPolicy`]. Because the stream is a lazy iterator, phasing runs on the consumer
//! thread between waits while the pool keeps computing.
//!
//! When a region fails, everything merged before it (including calls still held in the phasing
//! window) is yielded first, then the error, and then the stream ends. Ordering violations end
//! the stream immediately.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::errors::{FgvarError, Result};
use crate::filter::{FilterConfig, InclusionPolicy};
use crate::phasing::Phaser;
use crate::progress::RegionProgress;
use crate::region::GenomicRegion;
use crate::scheduler::RegionFuture;
use crate::variant::CandidateVariant;

/// Counters describing one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Regions whose calls were applied
    pub regions_merged: u64,
    /// Raw calls received from merged regions
    pub variants_received: u64,
    /// Pairwise merges performed by the phaser
    pub merges: u64,
    /// Finalized calls rejected by the inclusion policy
    pub variants_filtered: u64,
    /// Finalized calls yielded
    pub variants_emitted: u64,
}

/// Lazy, order-preserving stream of phased and filtered calls.
pub struct OrderedMerger {
    futures: std::vec::IntoIter<RegionFuture>,
    phaser: Phaser,
    policy: Arc<dyn InclusionPolicy>,
    filter: FilterConfig,
    progress: Option<RegionProgress>,
    ready: VecDeque<CandidateVariant>,
    error: Option<FgvarError>,
    previous_region: Option<GenomicRegion>,
    finished: bool,
    stats: MergeStats,
}

impl OrderedMerger {
    /// Creates a merger over `futures`, which must be in submission order.
    #[must_use]
    pub fn new(
        futures: Vec<RegionFuture>,
        phaser: Phaser,
        policy: Arc<dyn InclusionPolicy>,
        filter: FilterConfig,
    ) -> Self {
        Self {
            futures: futures.into_iter(),
            phaser,
            policy,
            filter,
            progress: None,
            ready: VecDeque::new(),
            error: None,
            previous_region: None,
            finished: false,
            stats: MergeStats::default(),
        }
    }

    /// Reports merge progress through `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: RegionProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Counters so far; complete once the iterator has returned `None`.
    #[must_use]
    pub fn stats(&self) -> MergeStats {
        MergeStats { merges: self.phaser.merges(), ..self.stats }
    }

    /// The last region whose calls were fully applied.
    #[must_use]
    pub fn last_merged_region(&self) -> Option<&GenomicRegion> {
        self.previous_region.as_ref()
    }

    fn merge_next_region(&mut self, future: RegionFuture) -> Result<()> {
        let region = future.region().clone();
        if let Some(previous) = &self.previous_region {
            if !previous.precedes(&region) {
                return Err(FgvarError::OrderingViolation {
                    context: format!("region {region}"),
                    reason: format!("does not follow previously merged region {previous}"),
                });
            }
        }

        let variants = future.wait()?;
        validate_region_variants(&region, &variants)?;

        let count = variants.len();
        for variant in variants {
            self.stats.variants_received += 1;
            let released = self.phaser.push(variant)?;
            self.release(released);
        }

        debug!("Merged region {region}: {count} variants, {} pending", self.phaser.pending());
        if let Some(progress) = &self.progress {
            progress.record(count);
        }
        self.stats.regions_merged += 1;
        self.previous_region = Some(region);
        Ok(())
    }

    fn release(&mut self, variants: Vec<CandidateVariant>) {
        for variant in variants {
            if self.policy.include(&variant, &self.filter) {
                self.stats.variants_emitted += 1;
                self.ready.push_back(variant);
            } else {
                trace!("Excluding {variant} ({})", variant.filter_string());
                self.stats.variants_filtered += 1;
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        match self.phaser.flush() {
            Ok(released) => self.release(released),
            Err(e) => self.error = Some(e),
        }
        if let Some(progress) = &self.progress {
            progress.log_final();
        }
    }

    fn fail(&mut self, error: FgvarError) {
        self.finished = true;
        // Later regions may still be running; they are never merged
        self.futures = Vec::new().into_iter();

        if !error.is_fatal() {
            match self.phaser.flush() {
                Ok(released) => self.release(released),
                Err(flush_error) => warn!("Discarding phasing window after failure: {flush_error}"),
            }
        }
        self.error = Some(error);
    }
}

impl Iterator for OrderedMerger {
    type Item = Result<CandidateVariant>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(variant) = self.ready.pop_front() {
                return Some(Ok(variant));
            }
            if let Some(error) = self.error.take() {
                return Some(Err(error));
            }
            if self.finished {
                return None;
            }

            match self.futures.next() {
                Some(future) => {
                    if let Err(e) = self.merge_next_region(future) {
                        self.fail(e);
                    }
                }
                None => self.finish(),
            }
        }
    }
}

impl std::fmt::Debug for OrderedMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedMerger")
            .field("remaining_regions", &self.futures.len())
            .field("phaser", &self.phaser)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Checks that a region's calls belong to it and are sorted by position.
fn validate_region_variants(region: &GenomicRegion, variants: &[CandidateVariant]) -> Result<()> {
    let violation = |reason: String| FgvarError::OrderingViolation {
        context: format!("region {region}"),
        reason,
    };

    for variant in variants {
        if !region.contains(&variant.chromosome, variant.position) {
            return Err(violation(format!("{variant} lies outside the region")));
        }
    }
    for pair in variants.windows(2) {
        if pair[1].position < pair[0].position {
            return Err(violation(format!("{} follows {}", pair[1], pair[0])));
        }
    }
    Ok(())
}
