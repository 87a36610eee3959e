//! A failing region keeps everything merged before it and nothing after it.

use std::sync::Arc;
use std::time::Duration;

use fgvar_lib::config::PipelineConfig;
use fgvar_lib::errors::FgvarError;
use fgvar_lib::pipeline::ChromosomePipeline;
use fgvar_lib::sink::{OutputMode, OutputSink};

use crate::helpers::{ScriptedRegions, positions, providers, run_chromosome, snv};

fn config() -> PipelineConfig {
    PipelineConfig { region_size: 1000, threads: 4, ..PipelineConfig::default() }
}

fn one_call_per_region() -> ScriptedRegions {
    ScriptedRegions::new(vec![
        snv("chr1", 100, b'G'),
        snv("chr1", 1100, b'G'),
        snv("chr1", 2100, b'G'),
        snv("chr1", 3100, b'G'),
        snv("chr1", 4100, b'G'),
    ])
}

#[test]
fn test_streaming_keeps_regions_before_failure() {
    // The failing region finishes long before the first region
    let computation = one_call_per_region()
        .with_failure("chr1", 2001)
        .with_delay(1, Duration::from_millis(200));
    let pipeline =
        ChromosomePipeline::new(config(), Arc::new(computation), providers(&[("chr1", 5000)]))
            .unwrap();

    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Streaming);
    assert_eq!(positions(&written), vec![100, 1100]);

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("scripted failure"));
    let Some(FgvarError::RegionComputation { region, .. }) = err.downcast_ref::<FgvarError>()
    else {
        panic!("unexpected error: {err:#}");
    };
    assert_eq!(region, "chr1:2001-3000");
}

#[test]
fn test_buffered_discards_failed_chromosome() {
    let computation = one_call_per_region().with_failure("chr1", 4001);
    let pipeline =
        ChromosomePipeline::new(config(), Arc::new(computation), providers(&[("chr1", 5000)]))
            .unwrap();

    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Buffered);
    assert!(result.is_err());
    assert!(written.is_empty());
}

#[test]
fn test_phasing_window_released_before_failure() {
    // 990 and 995 phase into one call that is still pending when region two fails
    let computation = ScriptedRegions::new(vec![snv("chr1", 990, b'G'), snv("chr1", 995, b'A')])
        .with_failure("chr1", 1001);
    let pipeline =
        ChromosomePipeline::new(config(), Arc::new(computation), providers(&[("chr1", 3000)]))
            .unwrap();

    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Streaming);
    assert!(result.is_err());
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].position, 990);
    assert_eq!(written[0].ref_allele.len(), 6);
    assert_eq!(written[0].merged_from, 2);
}

#[test]
fn test_failed_chromosome_keeps_earlier_chromosomes() {
    let computation = ScriptedRegions::new(vec![snv("chr1", 10, b'G'), snv("chr2", 10, b'G')])
        .with_failure("chr2", 1);
    let pipeline = ChromosomePipeline::new(
        config(),
        Arc::new(computation),
        providers(&[("chr1", 1000), ("chr2", 1000)]),
    )
    .unwrap();

    for mode in [OutputMode::Streaming, OutputMode::Buffered] {
        let mut sink = OutputSink::new(mode, Vec::new());
        let chromosomes = vec!["chr1".to_string(), "chr2".to_string()];
        assert!(pipeline.process_all(&chromosomes, &mut sink).is_err());
        let written = sink.finish().unwrap();
        assert_eq!(written.len(), 1, "{mode} output");
        assert_eq!(written[0].chromosome, "chr1");
    }
}
