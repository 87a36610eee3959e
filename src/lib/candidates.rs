//! Tab-separated candidate tables.
//!
//! Candidates enter the pipeline from a TSV table and phased calls leave it in the same layout
//! with an extra `merged_from` column:
//!
//! ```text
//! chrom, pos, ref, alt, filters,
//! tumor_ref_support, tumor_alt_support, tumor_depth,
//! normal_ref_support, normal_alt_support, normal_depth,
//! merged_from
//! ```
//!
//! The normal columns may be left empty for tumor-only calls. `filters` is `PASS` (or `.`) for
//! passing calls and a `;`-separated list of flags otherwise.
//!
//! [`CandidateTable`] serves a pre-computed table as a [`RegionComputation`], so the phasing and
//! ordering machinery can be run over calls made elsewhere.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::errors::FgvarError;
use crate::providers::{Providers, ReferenceProvider};
use crate::region::GenomicRegion;
use crate::scheduler::RegionComputation;
use crate::sink::VariantWriter;
use crate::variant::{CandidateVariant, SampleSupport};

fn one() -> u32 {
    1
}

/// One row of a candidate or phased-call table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRow {
    /// Chromosome name
    pub chrom: String,
    /// 1-based position
    pub pos: u32,
    /// Reference allele
    #[serde(rename = "ref")]
    pub ref_allele: String,
    /// Alternate allele
    #[serde(rename = "alt")]
    pub alt_allele: String,
    /// `PASS` or `;`-separated filter flags
    pub filters: String,
    pub tumor_ref_support: u32,
    pub tumor_alt_support: u32,
    pub tumor_depth: u32,
    pub normal_ref_support: Option<u32>,
    pub normal_alt_support: Option<u32>,
    pub normal_depth: Option<u32>,
    /// Raw candidates combined into this call; absent in input tables
    #[serde(default = "one")]
    pub merged_from: u32,
}

impl From<&CandidateVariant> for VariantRow {
    fn from(variant: &CandidateVariant) -> Self {
        let tumor = variant.target().copied().unwrap_or_default();
        let normal = variant.samples.get(1);
        Self {
            chrom: variant.chromosome.clone(),
            pos: variant.position,
            ref_allele: String::from_utf8_lossy(&variant.ref_allele).into_owned(),
            alt_allele: String::from_utf8_lossy(&variant.alt_allele).into_owned(),
            filters: variant.filter_string(),
            tumor_ref_support: tumor.ref_support,
            tumor_alt_support: tumor.alt_support,
            tumor_depth: tumor.depth,
            normal_ref_support: normal.map(|s| s.ref_support),
            normal_alt_support: normal.map(|s| s.alt_support),
            normal_depth: normal.map(|s| s.depth),
            merged_from: variant.merged_from,
        }
    }
}

impl TryFrom<VariantRow> for CandidateVariant {
    type Error = FgvarError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| FgvarError::InvalidParameter {
            parameter: format!("{}:{}", row.chrom, row.pos),
            reason,
        };

        if row.pos == 0 {
            return Err(invalid("positions are 1-based".to_string()));
        }
        if row.ref_allele.is_empty() || row.alt_allele.is_empty() {
            return Err(invalid("REF and ALT must be non-empty".to_string()));
        }

        let mut variant = CandidateVariant::new(
            row.chrom.clone(),
            row.pos,
            row.ref_allele.as_bytes(),
            row.alt_allele.as_bytes(),
        )
        .with_sample(SampleSupport::new(
            row.tumor_ref_support,
            row.tumor_alt_support,
            row.tumor_depth,
        ));

        match (row.normal_ref_support, row.normal_alt_support, row.normal_depth) {
            (Some(ref_support), Some(alt_support), Some(depth)) => {
                variant = variant.with_sample(SampleSupport::new(ref_support, alt_support, depth));
            }
            (None, None, None) => {}
            _ => return Err(invalid("normal support columns are partially filled".to_string())),
        }

        if row.filters != "PASS" && row.filters != "." && !row.filters.is_empty() {
            for flag in row.filters.split(';').filter(|f| !f.is_empty()) {
                variant = variant.with_filter(flag);
            }
        }
        variant.merged_from = row.merged_from.max(1);
        Ok(variant)
    }
}

/// Reads every call from a candidate table.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is malformed; the message names the
/// offending line.
pub fn read_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateVariant>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open candidate table: {}", path.display()))?;

    let mut variants = Vec::new();
    for (index, result) in reader.deserialize::<VariantRow>().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let row = result.map_err(|e| FgvarError::InvalidFileFormat {
            file_type: "Candidate TSV".to_string(),
            path: path.display().to_string(),
            reason: format!("line {line}: {e}"),
        })?;
        let variant = CandidateVariant::try_from(row)
            .with_context(|| format!("Invalid candidate on line {line} of {}", path.display()))?;
        variants.push(variant);
    }
    Ok(variants)
}

/// Writes calls as a tab-separated table.
pub struct TsvVariantWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl TsvVariantWriter<File> {
    /// Creates (or truncates) a table at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn to_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Failed to create output table: {}", path.display()))?;
        Ok(Self { writer })
    }
}

impl<W: Write> TsvVariantWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer) }
    }

    /// Returns the underlying writer after flushing.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush table: {}", e.error()))
    }
}

impl<W: Write> VariantWriter for TsvVariantWriter<W> {
    fn write(&mut self, variant: &CandidateVariant) -> Result<()> {
        self.writer.serialize(VariantRow::from(variant))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> std::fmt::Debug for TsvVariantWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TsvVariantWriter")
    }
}

/// Pre-computed calls served region by region.
#[derive(Debug, Clone, Default)]
pub struct CandidateTable {
    chromosomes: Vec<String>,
    by_chromosome: HashMap<String, Vec<CandidateVariant>>,
    check_reference: bool,
}

impl CandidateTable {
    /// Groups calls by chromosome and sorts each chromosome by position.
    ///
    /// Reference alleles are checked against the reference when regions are computed.
    #[must_use]
    pub fn new(variants: impl IntoIterator<Item = CandidateVariant>) -> Self {
        let mut chromosomes = Vec::new();
        let mut by_chromosome: HashMap<String, Vec<CandidateVariant>> = HashMap::new();
        for variant in variants {
            if !by_chromosome.contains_key(&variant.chromosome) {
                chromosomes.push(variant.chromosome.clone());
            }
            by_chromosome.entry(variant.chromosome.clone()).or_default().push(variant);
        }
        for calls in by_chromosome.values_mut() {
            calls.sort_by_key(|v| v.position);
        }
        Self { chromosomes, by_chromosome, check_reference: true }
    }

    /// Enables or disables checking REF alleles against the reference.
    #[must_use]
    pub fn with_reference_check(mut self, check: bool) -> Self {
        self.check_reference = check;
        self
    }

    /// Chromosomes in the order first seen in the input.
    #[must_use]
    pub fn chromosomes(&self) -> &[String] {
        &self.chromosomes
    }

    /// Total number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_chromosome.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_chromosome.values().all(Vec::is_empty)
    }

    /// Calls that no region of `reference` covers, as `(chromosome, count)` in input order.
    ///
    /// A chromosome missing from the reference contributes all of its calls; otherwise only
    /// calls positioned past the end of the sequence count.
    #[must_use]
    pub fn unplaced(&self, reference: &dyn ReferenceProvider) -> Vec<(String, usize)> {
        self.chromosomes
            .iter()
            .filter_map(|chromosome| {
                let calls = self.by_chromosome.get(chromosome)?;
                let count = match reference.sequence_length(chromosome) {
                    Some(length) => calls.len() - calls.partition_point(|v| v.position <= length),
                    None => calls.len(),
                };
                (count > 0).then(|| (chromosome.clone(), count))
            })
            .collect()
    }

    /// Calls within `region`, in position order.
    #[must_use]
    pub fn in_region(&self, region: &GenomicRegion) -> &[CandidateVariant] {
        let Some(calls) = self.by_chromosome.get(region.chromosome()) else {
            return &[];
        };
        let from = calls.partition_point(|v| v.position < region.start());
        let to = calls.partition_point(|v| v.position <= region.end());
        &calls[from..to]
    }
}

impl RegionComputation for CandidateTable {
    fn compute(
        &self,
        region: &GenomicRegion,
        providers: &Providers,
    ) -> Result<Vec<CandidateVariant>> {
        let calls = self.in_region(region);
        if self.check_reference {
            for call in calls {
                let expected =
                    providers.reference.fetch(&call.chromosome, call.position, call.end())?;
                if !expected.eq_ignore_ascii_case(&call.ref_allele) {
                    bail!(
                        "REF allele of {call} does not match reference {}",
                        String::from_utf8_lossy(&expected)
                    );
                }
            }
        }
        Ok(calls.to_vec())
    }
}
