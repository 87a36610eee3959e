//! Candidate variant calls produced by region tasks.
//!
//! A [`CandidateVariant`] is a computed difference from the reference that has not yet been
//! finally accepted or rejected. Support counts are kept per sample; sample 0 is the target
//! (tumor) sample and every later sample is a non-target (normal) sample.

use std::collections::BTreeSet;
use std::fmt;

/// Read support for one allele pair in one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleSupport {
    /// Reads supporting the reference allele
    pub ref_support: u32,
    /// Reads supporting the alternate allele
    pub alt_support: u32,
    /// Total reads covering the variant
    pub depth: u32,
}

impl SampleSupport {
    #[must_use]
    pub fn new(ref_support: u32, alt_support: u32, depth: u32) -> Self {
        Self { ref_support, alt_support, depth }
    }

    /// Support for a call merged from two nearby calls.
    ///
    /// A read can only support the merged allele if it supports both inputs, so alt support is
    /// the smaller of the two; ref support and depth take the larger.
    #[must_use]
    pub fn combine(&self, other: &SampleSupport) -> SampleSupport {
        SampleSupport {
            ref_support: self.ref_support.max(other.ref_support),
            alt_support: self.alt_support.min(other.alt_support),
            depth: self.depth.max(other.depth),
        }
    }

    /// Fraction of reads supporting the alternate allele.
    #[must_use]
    pub fn allele_frequency(&self) -> f64 {
        if self.depth == 0 { 0.0 } else { f64::from(self.alt_support) / f64::from(self.depth) }
    }
}

/// A candidate variant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVariant {
    /// Chromosome name
    pub chromosome: String,
    /// 1-based position of the first reference base
    pub position: u32,
    /// Reference allele bases
    pub ref_allele: Vec<u8>,
    /// Alternate allele bases
    pub alt_allele: Vec<u8>,
    /// Per-sample support; index 0 is the target sample
    pub samples: Vec<SampleSupport>,
    /// Soft filter flags; empty means the call passes
    pub filters: BTreeSet<String>,
    /// Number of raw candidates combined into this call (1 for unmerged calls)
    pub merged_from: u32,
}

impl CandidateVariant {
    /// Creates a passing, unmerged candidate with no sample support.
    #[must_use]
    pub fn new(
        chromosome: impl Into<String>,
        position: u32,
        ref_allele: &[u8],
        alt_allele: &[u8],
    ) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            ref_allele: ref_allele.to_vec(),
            alt_allele: alt_allele.to_vec(),
            samples: Vec::new(),
            filters: BTreeSet::new(),
            merged_from: 1,
        }
    }

    /// Adds support for the next sample.
    #[must_use]
    pub fn with_sample(mut self, support: SampleSupport) -> Self {
        self.samples.push(support);
        self
    }

    /// Adds a soft filter flag.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.insert(filter.into());
        self
    }

    /// Last reference position covered by the call.
    #[must_use]
    pub fn end(&self) -> u32 {
        let len = u32::try_from(self.ref_allele.len()).unwrap_or(u32::MAX);
        self.position.saturating_add(len.max(1) - 1)
    }

    /// True when REF and ALT have equal length (SNV or MNV).
    #[must_use]
    pub fn is_substitution(&self) -> bool {
        !self.ref_allele.is_empty() && self.ref_allele.len() == self.alt_allele.len()
    }

    /// True when the call carries no filter flags.
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.filters.is_empty()
    }

    /// Support in the target sample, if any samples are present.
    #[must_use]
    pub fn target(&self) -> Option<&SampleSupport> {
        self.samples.first()
    }

    /// Highest alt support among the non-target samples (0 without any).
    #[must_use]
    pub fn max_non_target_alt_support(&self) -> u32 {
        self.samples.iter().skip(1).map(|s| s.alt_support).max().unwrap_or(0)
    }

    /// Filters rendered as VCF-style text: `PASS` or `;`-joined flags.
    #[must_use]
    pub fn filter_string(&self) -> String {
        if self.filters.is_empty() {
            "PASS".to_string()
        } else {
            self.filters.iter().map(String::as_str).collect::<Vec<_>>().join(";")
        }
    }
}

impl fmt::Display for CandidateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chromosome,
            self.position,
            String::from_utf8_lossy(&self.ref_allele),
            String::from_utf8_lossy(&self.alt_allele)
        )
    }
}
