//! Output order does not depend on which regions finish first.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use fgvar_lib::config::PipelineConfig;
use fgvar_lib::phasing::PhaseConfig;
use fgvar_lib::pipeline::ChromosomePipeline;
use fgvar_lib::sink::OutputMode;

use crate::helpers::{
    ScriptedRegions, assert_coordinate_sorted, base, positions, providers, run_chromosome, snv,
};

const CHROM_LENGTH: u32 = 5_000;

fn config(threads: usize, region_size: u32, distance: u32) -> PipelineConfig {
    PipelineConfig {
        region_size,
        threads,
        phase: PhaseConfig { distance, ..PhaseConfig::default() },
        ..PipelineConfig::default()
    }
}

/// Three regions finishing in reverse order still come out in coordinate order.
#[test]
fn test_three_regions_reverse_completion() {
    let calls = vec![snv("chr1", 500, b'A'), snv("chr1", 1500, b'A'), snv("chr1", 2500, b'A')];
    let computation = ScriptedRegions::new(calls)
        .with_delay(1, Duration::from_millis(300))
        .with_delay(1001, Duration::from_millis(100));
    let pipeline = ChromosomePipeline::new(
        config(3, 1000, 50),
        Arc::new(computation),
        providers(&[("chr1", 3000)]),
    )
    .unwrap();

    for mode in [OutputMode::Streaming, OutputMode::Buffered] {
        let (written, result) = run_chromosome(&pipeline, "chr1", mode);
        let summary = result.unwrap();
        assert_eq!(summary.regions, 3);
        assert_eq!(positions(&written), vec![500, 1500, 2500], "{mode} output");
    }
}

/// A call near the end of one region phases with a call at the start of the next.
#[test]
fn test_phasing_across_region_boundary() {
    let calls = vec![snv("chr1", 998, b'G'), snv("chr1", 1002, b'A')];
    let computation = ScriptedRegions::new(calls).with_delay(1, Duration::from_millis(100));
    let pipeline = ChromosomePipeline::new(
        config(2, 1000, 10),
        Arc::new(computation),
        providers(&[("chr1", 2000)]),
    )
    .unwrap();

    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Streaming);
    assert_eq!(result.unwrap().stats.merges, 1);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].position, 998);
    assert_eq!(written[0].ref_allele.len(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_parallel_output_matches_serial(
        call_positions in prop::collection::btree_set(1..=CHROM_LENGTH, 0..40),
        delays in prop::collection::vec(0u64..15, 10),
        threads in 2usize..6,
    ) {
        let calls: Vec<_> =
            call_positions.iter().map(|&p| snv("chr1", p, base(p + 1))).collect();

        let serial = ChromosomePipeline::new(
            config(1, 500, 10),
            Arc::new(ScriptedRegions::new(calls.clone())),
            providers(&[("chr1", CHROM_LENGTH)]),
        )
        .unwrap();
        let (expected, result) = run_chromosome(&serial, "chr1", OutputMode::Streaming);
        result.unwrap();

        let mut scripted = ScriptedRegions::new(calls);
        for (i, delay) in delays.iter().enumerate() {
            scripted = scripted.with_delay(i as u32 * 500 + 1, Duration::from_millis(*delay));
        }
        let parallel = ChromosomePipeline::new(
            config(threads, 500, 10),
            Arc::new(scripted),
            providers(&[("chr1", CHROM_LENGTH)]),
        )
        .unwrap();

        for mode in [OutputMode::Streaming, OutputMode::Buffered] {
            let (actual, result) = run_chromosome(&parallel, "chr1", mode);
            result.unwrap();
            assert_coordinate_sorted(&actual);
            prop_assert_eq!(&actual, &expected);
        }
    }
}
