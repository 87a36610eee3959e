//! Concurrent access to the partition store.

use std::sync::Arc;
use std::thread;

use fgvar_lib::config::PipelineConfig;
use fgvar_lib::partition::{PartitionKey, PartitionStore, register_read};
use fgvar_lib::pipeline::ChromosomePipeline;
use fgvar_lib::providers::{AlignedRead, InMemoryReads, Providers};
use fgvar_lib::region::GenomicRegion;
use fgvar_lib::sink::OutputMode;
use fgvar_lib::variant::CandidateVariant;

use crate::helpers::{reference, run_chromosome};

const THREADS: u32 = 8;
const MUTATIONS: u64 = 1_000;

/// Every thread touches every key; each key's own thread performs all of its mutations.
#[test]
fn test_one_state_per_key_under_contention() {
    let store: PartitionStore<Vec<u32>> = PartitionStore::new(1000, |_| Vec::new());

    thread::scope(|scope| {
        for t in 0..THREADS {
            let store = &store;
            scope.spawn(move || {
                for other in 0..THREADS {
                    store.get_or_create(&PartitionKey::new("chr1", other));
                }
                let partition = store.get_or_create(&PartitionKey::new("chr1", t));
                for _ in 0..MUTATIONS {
                    partition.with(|history| history.push(t));
                }
            });
        }
    });

    assert_eq!(store.len(), THREADS as usize);
    assert_eq!(store.created_count(), THREADS as usize);
    for t in 0..THREADS {
        let partition = store.get(&PartitionKey::new("chr1", t)).unwrap();
        let history = partition.lock();
        assert_eq!(history.len() as u64, MUTATIONS);
        assert!(history.iter().all(|&owner| owner == t));
    }
}

/// Threads racing on one key all update the same state.
#[test]
fn test_shared_key_serialises_updates() {
    let store: PartitionStore<u64> = PartitionStore::new(1000, |_| 0);
    let key = PartitionKey::new("chr2", 3);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..MUTATIONS {
                    store.get_or_create(&key).with(|count| *count += 1);
                }
            });
        }
    });

    assert_eq!(store.created_count(), 1);
    assert_eq!(*store.get(&key).unwrap().lock(), u64::from(THREADS) * MUTATIONS);
}

/// Mates seen by different region tasks meet in the partition of the fragment start.
#[test]
fn test_region_tasks_pair_mates_across_regions() {
    let mut reads = Vec::new();
    for i in 0..50u32 {
        let start = 900 + i * 40;
        let mate = start + 150;
        let name = format!("frag{i}");
        reads.push(AlignedRead::new(&name, "chr1", start, start + 99).with_mate("chr1", mate));
        reads.push(AlignedRead::new(&name, "chr1", mate, mate + 99).with_mate("chr1", start));
    }
    let reference = Arc::new(reference(&[("chr1", 5000)]));
    let providers = Providers::new(reference, Arc::new(InMemoryReads::new(reads)), 1000);

    let registering = |region: &GenomicRegion,
                       providers: &Providers|
     -> anyhow::Result<Vec<CandidateVariant>> {
        for read in providers.reads.fetch(region)? {
            // Each read belongs to the region holding its start
            if read.start >= region.start() {
                register_read(&providers.partitions, read);
            }
        }
        Ok(Vec::new())
    };

    let config = PipelineConfig {
        region_size: 250,
        threads: 6,
        evict_partitions: false,
        ..PipelineConfig::default()
    };
    let pipeline =
        ChromosomePipeline::new(config, Arc::new(registering), providers.clone()).unwrap();
    let (_, result) = run_chromosome(&pipeline, "chr1", OutputMode::Buffered);
    result.unwrap();

    let mut groups = 0;
    for key in providers.partitions.keys() {
        let partition = providers.partitions.get(&key).unwrap();
        let data = partition.lock();
        assert_eq!(data.incomplete_fragment_count(), 0, "unpaired reads in {key}");
        groups += data.duplicate_group_count();
    }
    assert_eq!(groups, 50);
}
