//! Per-partition duplicate and mate-pairing state.
//!
//! Reads are assigned to the partition holding the lower coordinate of their fragment, so both
//! mates of a pair land in the same partition even when they are fetched by different region
//! tasks. The first mate seen is parked as an incomplete fragment; when the second arrives the
//! pair is completed and the fragment joins the duplicate group for its coordinates.

use std::cmp::Ordering;

use ahash::AHashMap;

use super::{PartitionKey, PartitionStore};
use crate::providers::AlignedRead;

/// Coordinates identifying a fragment for duplicate grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentCoords {
    /// Chromosome of the lower coordinate
    pub chromosome: String,
    /// Lower of the read and mate starts
    pub lower: u32,
    /// Upper of the read and mate starts (equal to `lower` for unpaired reads)
    pub upper: u32,
    /// UMI, when grouping is UMI-aware
    pub umi: Option<String>,
}

impl FragmentCoords {
    /// Derives fragment coordinates from a read and its mate.
    ///
    /// Mates on another chromosome do not contribute an upper coordinate.
    #[must_use]
    pub fn from_read(read: &AlignedRead) -> Self {
        let (lower, upper) = match &read.mate {
            Some((mate_chrom, mate_start)) if *mate_chrom == read.chromosome => {
                (read.start.min(*mate_start), read.start.max(*mate_start))
            }
            _ => (read.start, read.start),
        };
        Self { chromosome: read.chromosome.clone(), lower, upper, umi: read.umi.clone() }
    }

    /// Text key, e.g. `chr1:100:350:ACGT`.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.umi {
            Some(umi) => format!("{}:{}:{}:{umi}", self.chromosome, self.lower, self.upper),
            None => format!("{}:{}:{}", self.chromosome, self.lower, self.upper),
        }
    }
}

/// One fragment in a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub name: String,
    pub score: u32,
}

/// Fragments sharing the same coordinates (and UMI), believed to come from one molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub coords: FragmentCoords,
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member kept as the group's primary: highest score, ties broken by smallest name.
    #[must_use]
    pub fn representative(&self) -> Option<&GroupMember> {
        self.members.iter().max_by(|a, b| match a.score.cmp(&b.score) {
            Ordering::Equal => b.name.cmp(&a.name),
            other => other,
        })
    }

    /// Names of the members that are not the representative.
    #[must_use]
    pub fn duplicates(&self) -> Vec<&str> {
        let keep = self.representative().map(|m| m.name.as_str());
        self.members.iter().map(|m| m.name.as_str()).filter(|n| Some(*n) != keep).collect()
    }
}

/// Mutable state for one partition.
#[derive(Debug)]
pub struct PartitionData {
    key: PartitionKey,
    duplicate_groups: AHashMap<FragmentCoords, DuplicateGroup>,
    incomplete_fragments: AHashMap<String, AlignedRead>,
}

impl PartitionData {
    #[must_use]
    pub fn new(key: &PartitionKey) -> Self {
        Self {
            key: key.clone(),
            duplicate_groups: AHashMap::new(),
            incomplete_fragments: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Pairs `read` with its waiting mate, or parks it until the mate arrives.
    ///
    /// Returns `(first_seen, read)` when the pair is complete.
    pub fn pair_mate(&mut self, read: AlignedRead) -> Option<(AlignedRead, AlignedRead)> {
        match self.incomplete_fragments.remove(&read.name) {
            Some(mate) => Some((mate, read)),
            None => {
                self.incomplete_fragments.insert(read.name.clone(), read);
                None
            }
        }
    }

    /// Adds a fragment to the duplicate group for `coords`, returning the group size.
    pub fn add_to_duplicate_group(
        &mut self,
        coords: FragmentCoords,
        name: impl Into<String>,
        score: u32,
    ) -> usize {
        let group = self
            .duplicate_groups
            .entry(coords.clone())
            .or_insert_with(|| DuplicateGroup { coords, members: Vec::new() });
        group.members.push(GroupMember { name: name.into(), score });
        group.members.len()
    }

    #[must_use]
    pub fn duplicate_group(&self, coords: &FragmentCoords) -> Option<&DuplicateGroup> {
        self.duplicate_groups.get(coords)
    }

    /// Removes and returns all duplicate groups, ordered by coordinates.
    pub fn take_duplicate_groups(&mut self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<_> = self.duplicate_groups.drain().map(|(_, g)| g).collect();
        groups.sort_by(|a, b| a.coords.cmp(&b.coords));
        groups
    }

    #[must_use]
    pub fn duplicate_group_count(&self) -> usize {
        self.duplicate_groups.len()
    }

    #[must_use]
    pub fn incomplete_fragment_count(&self) -> usize {
        self.incomplete_fragments.len()
    }

    /// True when no groups are open and no mates are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duplicate_groups.is_empty() && self.incomplete_fragments.is_empty()
    }
}

/// Outcome of registering a read with the partition store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRegistration {
    /// The read's mate has not been seen yet
    AwaitingMate,
    /// The fragment is complete and now belongs to a duplicate group of `group_size`
    Grouped { coords: FragmentCoords, group_size: usize },
}

/// Registers a read in the partition of its fragment's lower coordinate.
///
/// Paired reads whose mate is on the same chromosome are held until both mates have been
/// registered (possibly by different region tasks); everything else is grouped immediately.
/// Each fragment is grouped once, scored by the sum of its reads' scores.
pub fn register_read(store: &PartitionStore<PartitionData>, read: AlignedRead) -> ReadRegistration {
    let coords = FragmentCoords::from_read(&read);
    let partition = store.get_or_create_at(&coords.chromosome, coords.lower);
    let mut data = partition.lock();

    let same_chrom_mate = read.mate.as_ref().is_some_and(|(chrom, _)| *chrom == read.chromosome);
    let (name, score) = if same_chrom_mate {
        match data.pair_mate(read) {
            Some((first, second)) => (second.name, first.score.saturating_add(second.score)),
            None => return ReadRegistration::AwaitingMate,
        }
    } else {
        (read.name, read.score)
    };

    let group_size = data.add_to_duplicate_group(coords.clone(), name, score);
    ReadRegistration::Grouped { coords, group_size }
}
