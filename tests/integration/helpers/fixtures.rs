//! Reference, candidate and computation fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fgvar_lib::candidates::TsvVariantWriter;
use fgvar_lib::pipeline::{ChromosomePipeline, ChromosomeSummary};
use fgvar_lib::providers::{InMemoryReference, Providers};
use fgvar_lib::region::GenomicRegion;
use fgvar_lib::scheduler::RegionComputation;
use fgvar_lib::sink::{OutputMode, OutputSink, VariantWriter};
use fgvar_lib::variant::{CandidateVariant, SampleSupport};

const BASES: &[u8; 4] = b"ACGT";

/// Reference base at 1-based `position` of every fixture sequence (`ACGT` repeated).
pub fn base(position: u32) -> u8 {
    BASES[((position - 1) % 4) as usize]
}

/// A fixture sequence of `length` bases.
pub fn sequence(length: u32) -> Vec<u8> {
    (1..=length).map(base).collect()
}

/// In-memory reference holding `(name, length)` fixture sequences.
pub fn reference(sequences: &[(&str, u32)]) -> InMemoryReference {
    sequences.iter().fold(InMemoryReference::new(), |reference, (name, length)| {
        reference.with_sequence(*name, sequence(*length))
    })
}

/// Providers over a fixture reference with no reads.
pub fn providers(sequences: &[(&str, u32)]) -> Providers {
    Providers::reference_only(Arc::new(reference(sequences)), 10_000)
}

/// Passing SNV whose REF matches the fixture reference, with tumor and normal support.
pub fn snv(chromosome: &str, position: u32, alt: u8) -> CandidateVariant {
    CandidateVariant::new(chromosome, position, &[base(position)], &[alt])
        .with_sample(SampleSupport::new(20, 10, 30))
        .with_sample(SampleSupport::new(30, 0, 30))
}

/// Writes fixture sequences to a FASTA file, 60 bases per line.
pub fn write_fasta(path: &Path, sequences: &[(&str, u32)]) {
    let mut text = String::new();
    for (name, length) in sequences {
        text.push_str(&format!(">{name}\n"));
        for line in sequence(*length).chunks(60) {
            text.push_str(&String::from_utf8_lossy(line));
            text.push('\n');
        }
    }
    fs::write(path, text).expect("Failed to write FASTA");
}

/// Writes calls as a candidate table.
pub fn write_candidates(path: &Path, calls: &[CandidateVariant]) {
    let mut writer = TsvVariantWriter::to_path(path).expect("Failed to create candidate table");
    for call in calls {
        writer.write(call).expect("Failed to write candidate");
    }
    writer.finish().expect("Failed to flush candidate table");
}

/// Temporary path helper.
pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Serves fixed calls per region after a per-region delay, optionally failing some regions.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRegions {
    calls: Vec<CandidateVariant>,
    delays: HashMap<u32, Duration>,
    failures: Vec<(String, u32)>,
}

impl ScriptedRegions {
    pub fn new(calls: Vec<CandidateVariant>) -> Self {
        Self { calls, ..Self::default() }
    }

    /// Delays the region starting at `start`.
    pub fn with_delay(mut self, start: u32, delay: Duration) -> Self {
        self.delays.insert(start, delay);
        self
    }

    /// Fails the region starting at `start` on `chromosome`.
    pub fn with_failure(mut self, chromosome: &str, start: u32) -> Self {
        self.failures.push((chromosome.to_string(), start));
        self
    }
}

impl RegionComputation for ScriptedRegions {
    fn compute(
        &self,
        region: &GenomicRegion,
        _providers: &Providers,
    ) -> anyhow::Result<Vec<CandidateVariant>> {
        if let Some(delay) = self.delays.get(&region.start()) {
            thread::sleep(*delay);
        }
        if self.failures.iter().any(|(c, s)| c == region.chromosome() && *s == region.start()) {
            anyhow::bail!("scripted failure");
        }
        let mut calls: Vec<_> = self
            .calls
            .iter()
            .filter(|v| region.contains(&v.chromosome, v.position))
            .cloned()
            .collect();
        calls.sort_by_key(|v| v.position);
        Ok(calls)
    }
}

/// Processes one chromosome into a fresh sink, returning what the sink holds afterwards.
pub fn run_chromosome(
    pipeline: &ChromosomePipeline,
    chromosome: &str,
    mode: OutputMode,
) -> (Vec<CandidateVariant>, anyhow::Result<ChromosomeSummary>) {
    let mut sink = OutputSink::new(mode, Vec::new());
    let result = pipeline.process(chromosome, &mut sink);
    let written = sink.finish().expect("Failed to finish sink");
    (written, result)
}
