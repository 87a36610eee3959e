//! Genomic regions, the unit of parallel work.
//!
//! A chromosome is split once into contiguous, non-overlapping regions ordered by start
//! coordinate. Each region is computed independently on the worker pool and merged back in
//! the order produced here.
//!
//! Coordinates are 1-based and inclusive throughout.
//!
//! # Example
//!
//! ```
//! use fgvar_lib::region::split_chromosome;
//!
//! let regions = split_chromosome("chr1", 2500, 1000).unwrap();
//! let spans: Vec<_> = regions.iter().map(ToString::to_string).collect();
//! assert_eq!(spans, vec!["chr1:1-1000", "chr1:1001-2000", "chr1:2001-2500"]);
//! ```

use std::fmt;

use crate::errors::{FgvarError, Result};

/// A bounded, 1-based inclusive interval on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicRegion {
    chromosome: String,
    start: u32,
    end: u32,
}

impl GenomicRegion {
    /// Creates a region, rejecting empty or inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is zero or `end < start`.
    pub fn new(chromosome: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        let chromosome = chromosome.into();
        if start == 0 || end < start {
            return Err(FgvarError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!("{chromosome}:{start}-{end} is not a valid 1-based interval"),
            });
        }
        Ok(Self { chromosome, start, end })
    }

    #[must_use]
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of bases covered by the region.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Regions always cover at least one base.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `position` on this region's chromosome lies within the region.
    #[must_use]
    pub fn contains(&self, chromosome: &str, position: u32) -> bool {
        self.chromosome == chromosome && position >= self.start && position <= self.end
    }

    /// Returns true if `next` may be merged directly after `self`: same chromosome and
    /// starting after this region ends.
    #[must_use]
    pub fn precedes(&self, next: &GenomicRegion) -> bool {
        self.chromosome == next.chromosome && next.start > self.end
    }

    /// Formats the region as a BED line (0-based, half-open).
    #[must_use]
    pub fn to_bed_line(&self) -> String {
        format!("{}\t{}\t{}", self.chromosome, self.start - 1, self.end)
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

/// Splits a chromosome of `length` bases into consecutive regions of `region_size` bases.
///
/// The final region is truncated at the chromosome end. A zero-length chromosome yields no
/// regions.
///
/// # Errors
///
/// Returns an error if `region_size` is zero.
pub fn split_chromosome(
    chromosome: &str,
    length: u32,
    region_size: u32,
) -> Result<Vec<GenomicRegion>> {
    if region_size == 0 {
        return Err(FgvarError::InvalidParameter {
            parameter: "region-size".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let mut regions = Vec::with_capacity(length.div_ceil(region_size) as usize);
    let mut start = 1u32;
    while start <= length {
        let end = start.saturating_add(region_size - 1).min(length);
        regions.push(GenomicRegion { chromosome: chromosome.to_string(), start, end });
        match end.checked_add(1) {
            Some(next) => start = next,
            None => break,
        }
    }
    Ok(regions)
}
