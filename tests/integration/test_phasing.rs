//! Phasing and inclusion through the full pipeline.

use std::sync::Arc;

use parking_lot::Mutex;

use fgvar_lib::config::PipelineConfig;
use fgvar_lib::filter::FilterConfig;
use fgvar_lib::pipeline::ChromosomePipeline;
use fgvar_lib::sink::OutputMode;
use fgvar_lib::variant::{CandidateVariant, SampleSupport};

use crate::helpers::{ScriptedRegions, assert_mnv, providers, run_chromosome, snv};

fn config() -> PipelineConfig {
    PipelineConfig { region_size: 1000, threads: 2, ..PipelineConfig::default() }
}

fn pipeline(calls: Vec<CandidateVariant>) -> ChromosomePipeline {
    ChromosomePipeline::new(
        config(),
        Arc::new(ScriptedRegions::new(calls)),
        providers(&[("chr1", 3000)]),
    )
    .unwrap()
}

#[test]
fn test_nearby_substitutions_become_one_call() {
    // Reference at 1498..1501 is CGTA
    let calls = vec![snv("chr1", 1498, b'T'), snv("chr1", 1501, b'G')];
    let (written, result) = run_chromosome(&pipeline(calls), "chr1", OutputMode::Buffered);

    let summary = result.unwrap();
    assert_eq!(summary.stats.variants_received, 2);
    assert_eq!(summary.stats.merges, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(written.len(), 1);
    assert_mnv(&written[0], 1498, "CGTA", "TGTG");
    assert_eq!(written[0].merged_from, 2);
}

#[test]
fn test_isolated_calls_unchanged() {
    let calls = vec![snv("chr1", 100, b'G'), snv("chr1", 200, b'G'), snv("chr1", 2900, b'G')];
    let (written, result) = run_chromosome(&pipeline(calls.clone()), "chr1", OutputMode::Streaming);
    assert_eq!(result.unwrap().stats.merges, 0);
    assert_eq!(written, calls);
}

#[test]
fn test_policy_sees_merged_call() {
    // On its own the first call has too much normal support to be kept
    let noisy = CandidateVariant::new("chr1", 1498, b"C", b"T")
        .with_sample(SampleSupport::new(20, 10, 30))
        .with_sample(SampleSupport::new(20, 12, 32))
        .with_filter("max_germline_alt_support");
    let quiet = CandidateVariant::new("chr1", 1501, b"A", b"G")
        .with_sample(SampleSupport::new(20, 10, 30))
        .with_sample(SampleSupport::new(30, 2, 32))
        .with_filter("min_tumor_qual");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let recording_policy = move |variant: &CandidateVariant, config: &FilterConfig| {
        recorder.lock().push(variant.clone());
        variant.is_passing()
            || variant.max_non_target_alt_support() <= config.hard_max_normal_alt_support
    };

    let pipeline = pipeline(vec![noisy, quiet]).with_policy(Arc::new(recording_policy));
    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Buffered);
    result.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].merged_from, 2);

    assert_eq!(written.len(), 1);
    assert_mnv(&written[0], 1498, "CGTA", "TGTG");
    assert_eq!(written[0].samples[1], SampleSupport::new(30, 2, 32));
    assert_eq!(written[0].filter_string(), "max_germline_alt_support;min_tumor_qual");
}

#[test]
fn test_hard_filter_drops_flagged_calls() {
    let calls = vec![snv("chr1", 100, b'G').with_filter("low_qual"), snv("chr1", 500, b'G')];
    let config = PipelineConfig {
        filter: FilterConfig { hard_filter: true, ..FilterConfig::default() },
        ..config()
    };
    let pipeline = ChromosomePipeline::new(
        config,
        Arc::new(ScriptedRegions::new(calls)),
        providers(&[("chr1", 3000)]),
    )
    .unwrap();

    let (written, result) = run_chromosome(&pipeline, "chr1", OutputMode::Buffered);
    assert_eq!(result.unwrap().stats.variants_filtered, 1);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].position, 500);
}
