//! End-to-end CLI tests for the phase and regions commands.
//!
//! These tests run the actual `fgvar` binary and validate:
//! 1. Phasing a candidate table into a sorted output table
//! 2. Chromosome selection and streaming output
//! 3. Failure handling when a candidate does not match the reference
//! 4. The region layout written by `regions`

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use fgvar_lib::candidates::read_candidates;
use fgvar_lib::variant::CandidateVariant;

use crate::helpers::{assert_mnv, positions, snv, write_candidates, write_fasta};

const SEQUENCES: &[(&str, u32)] = &[("chr1", 3000), ("chr2", 1000)];

/// Candidates out of order, with one phased pair on chr1.
fn candidates() -> Vec<CandidateVariant> {
    vec![
        snv("chr2", 50, b'G'),
        snv("chr1", 1501, b'G'),
        snv("chr1", 2999, b'A'),
        snv("chr1", 1498, b'T'),
        snv("chr1", 10, b'G'),
    ]
}

fn run_phase(dir: &Path, extra: &[&str]) -> bool {
    let reference = dir.join("ref.fa");
    let input = dir.join("candidates.tsv");
    let output = dir.join("phased.tsv");

    let mut args = vec![
        "phase",
        "--input",
        input.to_str().unwrap(),
        "--ref",
        reference.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--region-size",
        "500",
        "--threads",
        "4",
    ];
    args.extend_from_slice(extra);

    Command::new(env!("CARGO_BIN_EXE_fgvar"))
        .args(&args)
        .status()
        .expect("Failed to run phase command")
        .success()
}

fn setup(calls: &[CandidateVariant]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_fasta(&temp_dir.path().join("ref.fa"), SEQUENCES);
    write_candidates(&temp_dir.path().join("candidates.tsv"), calls);
    temp_dir
}

#[test]
fn test_phase_command_basic() {
    let temp_dir = setup(&candidates());
    assert!(run_phase(temp_dir.path(), &[]), "Phase command failed");

    let phased = read_candidates(temp_dir.path().join("phased.tsv")).unwrap();
    assert_eq!(phased.len(), 4);

    let chromosomes: Vec<_> = phased.iter().map(|v| v.chromosome.as_str()).collect();
    assert_eq!(chromosomes, vec!["chr1", "chr1", "chr1", "chr2"]);
    assert_eq!(positions(&phased), vec![10, 1498, 2999, 50]);

    assert_mnv(&phased[1], 1498, "CGTA", "TGTG");
    assert_eq!(phased[1].merged_from, 2);
    assert_eq!(phased[0], snv("chr1", 10, b'G'));
}

#[test]
fn test_phase_command_selected_chromosome_streaming() {
    let temp_dir = setup(&candidates());
    assert!(run_phase(temp_dir.path(), &["--unsorted-output", "--chromosomes", "chr2"]));

    let phased = read_candidates(temp_dir.path().join("phased.tsv")).unwrap();
    assert_eq!(phased, vec![snv("chr2", 50, b'G')]);
}

#[test]
fn test_phase_command_no_phasing() {
    let temp_dir = setup(&candidates());
    assert!(run_phase(temp_dir.path(), &["--phase-distance", "0"]));

    let phased = read_candidates(temp_dir.path().join("phased.tsv")).unwrap();
    assert_eq!(positions(&phased), vec![10, 1498, 1501, 2999, 50]);
}

#[test]
fn test_phase_command_reference_mismatch() {
    // chr2:50 is C in the reference
    let mut calls = candidates();
    calls[0] = CandidateVariant::new("chr2", 50, b"T", b"G");
    let temp_dir = setup(&calls);

    assert!(!run_phase(temp_dir.path(), &["--unsorted-output"]), "Phase should fail");

    // chr1 was complete before chr2 failed
    let phased = read_candidates(temp_dir.path().join("phased.tsv")).unwrap();
    assert!(phased.iter().all(|v| v.chromosome == "chr1"));
    assert_eq!(phased.len(), 3);
}

#[test]
fn test_phase_command_unknown_chromosome() {
    let temp_dir = setup(&candidates());
    assert!(!run_phase(temp_dir.path(), &["--chromosomes", "chrZ"]));
}

#[test]
fn test_phase_command_skips_unplaced_candidates() {
    let mut calls = candidates();
    calls.push(snv("chr2", 1200, b'A'));
    calls.push(snv("chrUn", 5, b'C'));
    let temp_dir = setup(&calls);
    assert!(run_phase(temp_dir.path(), &[]), "Phase command failed");

    let phased = read_candidates(temp_dir.path().join("phased.tsv")).unwrap();
    assert_eq!(positions(&phased), vec![10, 1498, 2999, 50]);
}

#[test]
fn test_regions_command() {
    let temp_dir = TempDir::new().unwrap();
    let reference = temp_dir.path().join("ref.fa");
    let output = temp_dir.path().join("regions.bed");
    write_fasta(&reference, SEQUENCES);

    let status = Command::new(env!("CARGO_BIN_EXE_fgvar"))
        .args([
            "regions",
            "--ref",
            reference.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--region-size",
            "1200",
        ])
        .status()
        .expect("Failed to run regions command");
    assert!(status.success(), "Regions command failed");

    let bed = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = bed.lines().collect();
    assert_eq!(
        lines,
        vec!["chr1\t0\t1200", "chr1\t1200\t2400", "chr1\t2400\t3000", "chr2\t0\t1000"]
    );
}
