//! Rules for combining nearby calls when a phasing window is flushed.

use std::sync::Arc;

use crate::errors::{FgvarError, Result};
use crate::providers::ReferenceProvider;
use crate::variant::CandidateVariant;

/// Decides whether two neighbouring calls describe one event.
pub trait MergeRule: Send + Sync {
    /// Returns the combined call if `current` and `next` should be merged, or `None` to emit
    /// them separately. `next` never starts before `current`.
    ///
    /// # Errors
    ///
    /// Returns an error if the calls should merge but the combined call cannot be built.
    fn try_merge(
        &self,
        current: &CandidateVariant,
        next: &CandidateVariant,
        distance: u32,
    ) -> Result<Option<CandidateVariant>>;
}

/// Leaves every call as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMerge;

impl MergeRule for NoMerge {
    fn try_merge(
        &self,
        _current: &CandidateVariant,
        _next: &CandidateVariant,
        _distance: u32,
    ) -> Result<Option<CandidateVariant>> {
        Ok(None)
    }
}

/// Combines nearby substitutions into a single multi-nucleotide variant.
///
/// Two substitutions merge when they do not overlap, carry the same number of samples, and
/// `next.position - current.end()` is at most the phasing distance. Reference bases between
/// them are fetched from the provider and appear in both alleles:
///
/// ```text
/// 1498 A>T  +  1501 G>C   =>   1498 AxyG>TxyC
/// ```
pub struct MnvMergeRule {
    reference: Arc<dyn ReferenceProvider>,
}

impl MnvMergeRule {
    #[must_use]
    pub fn new(reference: Arc<dyn ReferenceProvider>) -> Self {
        Self { reference }
    }

    fn gap_bases(&self, current: &CandidateVariant, next: &CandidateVariant) -> Result<Vec<u8>> {
        let gap_start = current.end() + 1;
        if next.position <= gap_start {
            return Ok(Vec::new());
        }
        let mut bases = self
            .reference
            .fetch(&current.chromosome, gap_start, next.position - 1)
            .map_err(|e| FgvarError::MergeFailed {
                variants: format!("{current} + {next}"),
                reason: format!("{e:#}"),
            })?;
        bases.make_ascii_uppercase();
        Ok(bases)
    }
}

impl MergeRule for MnvMergeRule {
    fn try_merge(
        &self,
        current: &CandidateVariant,
        next: &CandidateVariant,
        distance: u32,
    ) -> Result<Option<CandidateVariant>> {
        if current.chromosome != next.chromosome
            || !current.is_substitution()
            || !next.is_substitution()
            || next.position <= current.end()
            || next.position - current.end() > distance
            || current.samples.len() != next.samples.len()
        {
            return Ok(None);
        }

        let gap = self.gap_bases(current, next)?;

        let mut ref_allele = current.ref_allele.clone();
        ref_allele.extend_from_slice(&gap);
        ref_allele.extend_from_slice(&next.ref_allele);

        let mut alt_allele = current.alt_allele.clone();
        alt_allele.extend_from_slice(&gap);
        alt_allele.extend_from_slice(&next.alt_allele);

        let samples =
            current.samples.iter().zip(&next.samples).map(|(a, b)| a.combine(b)).collect();
        let filters = current.filters.union(&next.filters).cloned().collect();

        Ok(Some(CandidateVariant {
            chromosome: current.chromosome.clone(),
            position: current.position,
            ref_allele,
            alt_allele,
            samples,
            filters,
            merged_from: current.merged_from + next.merged_from,
        }))
    }
}

impl std::fmt::Debug for MnvMergeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MnvMergeRule")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryReference;
    use crate::variant::SampleSupport;
    use rstest::rstest;

    fn rule() -> MnvMergeRule {
        // Positions 1..=12
        MnvMergeRule::new(Arc::new(InMemoryReference::new().with_sequence("chr1", "ACGTacgtACGT")))
    }

    fn snv(position: u32, ref_base: &[u8], alt_base: &[u8]) -> CandidateVariant {
        CandidateVariant::new("chr1", position, ref_base, alt_base)
            .with_sample(SampleSupport::new(10, 8, 20))
            .with_sample(SampleSupport::new(30, 0, 30))
    }

    #[test]
    fn test_merges_with_gap_bases() {
        let merged = rule().try_merge(&snv(2, b"C", b"T"), &snv(5, b"A", b"G"), 10).unwrap();
        let merged = merged.unwrap();
        assert_eq!(merged.position, 2);
        // Gap bases 3..=4 are "GT"
        assert_eq!(merged.ref_allele, b"CGTA");
        assert_eq!(merged.alt_allele, b"TGTG");
        assert_eq!(merged.merged_from, 2);
    }

    #[test]
    fn test_adjacent_substitutions_share_no_gap() {
        let merged = rule().try_merge(&snv(2, b"C", b"T"), &snv(3, b"G", b"A"), 1).unwrap();
        let merged = merged.unwrap();
        assert_eq!(merged.ref_allele, b"CG");
        assert_eq!(merged.alt_allele, b"TA");
    }

    #[test]
    fn test_gap_bases_are_uppercased() {
        let merged = rule().try_merge(&snv(4, b"T", b"A"), &snv(9, b"A", b"C"), 10).unwrap();
        assert_eq!(merged.unwrap().ref_allele, b"TACGTA");
    }

    #[rstest]
    #[case::beyond_distance(snv(2, b"C", b"T"), snv(8, b"T", b"A"), 5)]
    #[case::same_position(snv(2, b"C", b"T"), snv(2, b"C", b"G"), 10)]
    #[case::deletion(CandidateVariant::new("chr1", 2, b"CG", b"C"), snv(5, b"A", b"G"), 10)]
    #[case::insertion(snv(2, b"C", b"T"), CandidateVariant::new("chr1", 5, b"A", b"AT"), 10)]
    #[case::other_chromosome(snv(2, b"C", b"T"), CandidateVariant::new("chr2", 5, b"A", b"G"), 10)]
    fn test_does_not_merge(
        #[case] current: CandidateVariant,
        #[case] next: CandidateVariant,
        #[case] distance: u32,
    ) {
        assert!(rule().try_merge(&current, &next, distance).unwrap().is_none());
    }

    #[test]
    fn test_support_and_filters_combine() {
        let a = CandidateVariant::new("chr1", 2, b"C", b"T")
            .with_sample(SampleSupport::new(10, 8, 20))
            .with_filter("strand_bias");
        let b = CandidateVariant::new("chr1", 3, b"G", b"A")
            .with_sample(SampleSupport::new(12, 6, 19))
            .with_filter("min_tumor_qual");
        let merged = rule().try_merge(&a, &b, 5).unwrap().unwrap();
        assert_eq!(merged.samples, vec![SampleSupport::new(12, 6, 20)]);
        assert_eq!(merged.filter_string(), "min_tumor_qual;strand_bias");
    }

    #[test]
    fn test_reference_failure_is_an_error() {
        let a = CandidateVariant::new("chrX", 2, b"C", b"T");
        let b = CandidateVariant::new("chrX", 6, b"G", b"A");
        let err = rule().try_merge(&a, &b, 10).unwrap_err();
        assert!(matches!(err, FgvarError::MergeFailed { .. }));
    }

    #[test]
    fn test_no_merge() {
        assert!(NoMerge.try_merge(&snv(2, b"C", b"T"), &snv(3, b"G", b"A"), 10).unwrap().is_none());
    }
}
