//! Collaborator interfaces consumed by region tasks.
//!
//! Region computations see the outside world only through these traits: a
//! [`ReferenceProvider`] for reference bases and a [`ReadProvider`] for aligned reads. Both are
//! shared across worker threads, so implementations must be `Send + Sync`.
//!
//! [`Providers`] bundles them with the shared [`PartitionStore`] that carries state across
//! region boundaries.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::errors::FgvarError;
use crate::partition::{PartitionData, PartitionStore};
use crate::region::GenomicRegion;

/// Random-access reference sequence.
pub trait ReferenceProvider: Send + Sync {
    /// Returns the bases from `start` to `end` (1-based, inclusive) on `chromosome`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chromosome is unknown or the interval exceeds its length.
    fn fetch(&self, chromosome: &str, start: u32, end: u32) -> Result<Vec<u8>>;

    /// Length of `chromosome`, or `None` if it is not present.
    fn sequence_length(&self, chromosome: &str) -> Option<u32>;

    /// Names of all sequences, in reference order.
    fn sequence_names(&self) -> Vec<String>;

    /// Returns the single base at `position` (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the chromosome is unknown or the position is past its end.
    fn base_at(&self, chromosome: &str, position: u32) -> Result<u8> {
        let bases = self.fetch(chromosome, position, position)?;
        bases.first().copied().ok_or_else(|| {
            FgvarError::InvalidParameter {
                parameter: "position".to_string(),
                reason: format!("{chromosome}:{position} returned no bases"),
            }
            .into()
        })
    }
}

/// An aligned read as seen by region computations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRead {
    /// Read (template) name, shared by both mates
    pub name: String,
    /// Chromosome of the alignment
    pub chromosome: String,
    /// 1-based alignment start
    pub start: u32,
    /// 1-based inclusive alignment end
    pub end: u32,
    /// Mate chromosome and start, for paired reads with a mapped mate
    pub mate: Option<(String, u32)>,
    /// Unique molecular identifier, if present
    pub umi: Option<String>,
    /// Sum of base qualities, used to pick duplicate-group representatives
    pub score: u32,
}

impl AlignedRead {
    /// Creates an unpaired read with no UMI and zero score.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        chromosome: impl Into<String>,
        start: u32,
        end: u32,
    ) -> Self {
        Self {
            name: name.into(),
            chromosome: chromosome.into(),
            start,
            end,
            mate: None,
            umi: None,
            score: 0,
        }
    }

    #[must_use]
    pub fn with_mate(mut self, chromosome: impl Into<String>, start: u32) -> Self {
        self.mate = Some((chromosome.into(), start));
        self
    }

    #[must_use]
    pub fn with_umi(mut self, umi: impl Into<String>) -> Self {
        self.umi = Some(umi.into());
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }
}

/// Source of aligned reads for a region.
pub trait ReadProvider: Send + Sync {
    /// Returns reads overlapping `region`, sorted by start.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be read.
    fn fetch(&self, region: &GenomicRegion) -> Result<Vec<AlignedRead>>;
}

/// Read provider for computations that do not look at reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReads;

impl ReadProvider for NoReads {
    fn fetch(&self, _region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        Ok(Vec::new())
    }
}

/// Reads held in memory, grouped by chromosome.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReads {
    reads: HashMap<String, Vec<AlignedRead>>,
}

impl InMemoryReads {
    /// Builds the provider, sorting each chromosome's reads by start.
    #[must_use]
    pub fn new(reads: impl IntoIterator<Item = AlignedRead>) -> Self {
        let mut by_chrom: HashMap<String, Vec<AlignedRead>> = HashMap::new();
        for read in reads {
            by_chrom.entry(read.chromosome.clone()).or_default().push(read);
        }
        for reads in by_chrom.values_mut() {
            reads.sort_by_key(|r| r.start);
        }
        Self { reads: by_chrom }
    }
}

impl ReadProvider for InMemoryReads {
    fn fetch(&self, region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        let Some(reads) = self.reads.get(region.chromosome()) else {
            return Ok(Vec::new());
        };
        Ok(reads
            .iter()
            .filter(|r| r.start <= region.end() && r.end >= region.start())
            .cloned()
            .collect())
    }
}

/// Reference sequences held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    names: Vec<String>,
    sequences: HashMap<String, Vec<u8>>,
}

impl InMemoryReference {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a sequence.
    #[must_use]
    pub fn with_sequence(mut self, name: impl Into<String>, bases: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        if !self.sequences.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.sequences.insert(name, bases.into());
        self
    }
}

impl ReferenceProvider for InMemoryReference {
    fn fetch(&self, chromosome: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let sequence = self
            .sequences
            .get(chromosome)
            .ok_or_else(|| FgvarError::ReferenceNotFound { ref_name: chromosome.to_string() })?;
        slice_sequence(chromosome, sequence, start, end)
    }

    fn sequence_length(&self, chromosome: &str) -> Option<u32> {
        self.sequences.get(chromosome).and_then(|s| u32::try_from(s.len()).ok())
    }

    fn sequence_names(&self) -> Vec<String> {
        self.names.clone()
    }
}

/// Extracts `start..=end` (1-based) from a stored sequence with range checking.
pub(crate) fn slice_sequence(
    chromosome: &str,
    sequence: &[u8],
    start: u32,
    end: u32,
) -> Result<Vec<u8>> {
    if start == 0 || end < start || end as usize > sequence.len() {
        return Err(FgvarError::InvalidParameter {
            parameter: "region".to_string(),
            reason: format!(
                "Requested region {chromosome}:{start}-{end} exceeds sequence length {}",
                sequence.len()
            ),
        }
        .into());
    }
    Ok(sequence[(start as usize - 1)..end as usize].to_vec())
}

/// Everything a region computation may consult.
#[derive(Clone)]
pub struct Providers {
    /// Reference bases
    pub reference: Arc<dyn ReferenceProvider>,
    /// Aligned reads
    pub reads: Arc<dyn ReadProvider>,
    /// Cross-region partition state
    pub partitions: Arc<PartitionStore<PartitionData>>,
}

impl Providers {
    /// Bundles a reference and read source with a fresh partition store.
    #[must_use]
    pub fn new(
        reference: Arc<dyn ReferenceProvider>,
        reads: Arc<dyn ReadProvider>,
        partition_size: u32,
    ) -> Self {
        Self {
            reference,
            reads,
            partitions: Arc::new(PartitionStore::new(partition_size, PartitionData::new)),
        }
    }

    /// Bundles a reference with no reads, for computations driven by pre-computed candidates.
    #[must_use]
    pub fn reference_only(reference: Arc<dyn ReferenceProvider>, partition_size: u32) -> Self {
        Self::new(reference, Arc::new(NoReads), partition_size)
    }
}
