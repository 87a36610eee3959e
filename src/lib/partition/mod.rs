//! Cross-region partition state.
//!
//! Region tasks run concurrently, but some state must be shared between them: a read pair
//! whose mates fall in different regions, or a duplicate group whose members are discovered by
//! more than one task. That state is bucketed into fixed-size coordinate partitions, each with
//! its own lock, so tasks working on unrelated partitions never contend.
//!
//! - [`PartitionKey`] - chromosome plus bucket index
//! - [`PartitionStore`] - concurrent get-or-create map with per-partition locking
//! - [`PartitionData`] - duplicate groups and reads awaiting their mate

use std::fmt;

pub mod data;
pub mod store;

pub use data::{
    DuplicateGroup, FragmentCoords, GroupMember, PartitionData, ReadRegistration, register_read,
};
pub use store::{Partition, PartitionStore};

/// Identifies a fixed-size coordinate bucket on one chromosome.
///
/// Displays as `chromosome_index`, e.g. `chr1_0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    chromosome: String,
    index: u32,
}

impl PartitionKey {
    #[must_use]
    pub fn new(chromosome: impl Into<String>, index: u32) -> Self {
        Self { chromosome: chromosome.into(), index }
    }

    /// Key of the partition containing the 1-based `position`.
    ///
    /// Bucket `i` covers positions `i * size + 1 ..= (i + 1) * size`, so partition boundaries
    /// line up with region boundaries when the region size is a multiple of the partition size.
    /// A `partition_size` of zero is treated as one, as in [`PartitionStore`].
    #[must_use]
    pub fn for_position(chromosome: &str, position: u32, partition_size: u32) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            index: position.saturating_sub(1) / partition_size.max(1),
        }
    }

    #[must_use]
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Last 1-based position covered by this partition.
    #[must_use]
    pub fn end(&self, partition_size: u32) -> u32 {
        (self.index.saturating_add(1)).saturating_mul(partition_size)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chromosome, self.index)
    }
}
