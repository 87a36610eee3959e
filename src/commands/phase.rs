//! Phase pre-computed candidate calls into multi-nucleotide variants.
//!
//! Each chromosome is split into regions that are served from the candidate table in parallel,
//! then merged back in coordinate order through the phasing window and inclusion policy.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use fgvar_lib::candidates::{CandidateTable, TsvVariantWriter, read_candidates};
use fgvar_lib::config::PipelineConfig;
use fgvar_lib::logging::{OperationTimer, log_pipeline_summary};
use fgvar_lib::pipeline::{ChromosomePipeline, ChromosomeSummary};
use fgvar_lib::providers::{Providers, ReferenceProvider};
use fgvar_lib::reference::ReferenceReader;
use fgvar_lib::sink::{OutputMode, OutputSink};
use fgvar_lib::validation::{validate_files_exist, validate_output_dir, validate_positive};

use super::command::Command;
use super::common::{FilterOptions, PhasingOptions, RegionOptions, ThreadingOptions};

/// Phases candidate calls and writes the finalized table.
#[derive(Parser, Debug)]
#[command(
    name = "phase",
    author,
    version,
    about = "\x1b[38;5;173m[PHASING]\x1b[0m \x1b[36mMerge phased substitutions in a candidate table\x1b[0m",
    long_about = r#"
Merges nearby substitutions in a table of candidate variant calls into multi-nucleotide variants
and writes the finalized calls in coordinate order.

Each chromosome is split into regions of `--region-size` bases that are processed in parallel on
`--threads` worker threads. Regions are merged back strictly in coordinate order, so the output is
identical for any thread count. Two substitutions are merged when the gap between them is at most
`--phase-distance` bases; the bases in the gap are taken from the reference.

Inclusion is decided after merging. Calls with no filter flags are always kept. Soft-filtered
calls are kept while their largest non-target alt support is at most
`--hard-max-normal-alt-support`, unless `--hard-filter` is given.

## Input

A tab-separated table with a header and the columns:

    chrom pos ref alt filters tumor_ref_support tumor_alt_support tumor_depth
    normal_ref_support normal_alt_support normal_depth

The normal columns may be empty. Rows do not need to be sorted. Every REF allele must match the
reference.

## Output

The same table with an additional `merged_from` column giving the number of input calls combined
into each output call. By default each chromosome is written sorted once it is complete, and a
chromosome that fails contributes nothing. With `--unsorted-output` calls are written as soon as
they are finalized and a failure leaves everything written before it in place.
"#
)]
pub struct Phase {
    /// Input candidate table
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output table of phased calls
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    #[command(flatten)]
    pub regions: RegionOptions,

    #[command(flatten)]
    pub threading: ThreadingOptions,

    #[command(flatten)]
    pub phasing: PhasingOptions,

    #[command(flatten)]
    pub filter: FilterOptions,

    /// Write calls as they are finalized instead of sorting each chromosome
    #[arg(long = "unsorted-output", default_value = "false")]
    pub unsorted_output: bool,
}

impl Phase {
    fn output_mode(&self) -> OutputMode {
        if self.unsorted_output { OutputMode::Streaming } else { OutputMode::Buffered }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            region_size: self.regions.region_size,
            partition_size: self.threading.partition_size,
            threads: self.threading.threads,
            phase: self.phasing.to_config(),
            filter: self.filter.to_config(),
            output_mode: self.output_mode(),
            evict_partitions: true,
        }
    }

    fn validate(&self) -> Result<()> {
        validate_files_exist(&[
            (&self.input, "Candidate TSV"),
            (&self.regions.reference, "Reference FASTA"),
        ])?;
        validate_output_dir(&self.output, "Output TSV")?;
        validate_positive(self.regions.region_size, "region-size")?;
        validate_positive(self.threading.threads, "threads")?;
        Ok(())
    }
}

impl Command for Phase {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("Phase");
        info!("  Command line: {command_line}");
        info!("  Input: {}", self.input.display());
        info!("  Reference: {}", self.regions.reference.display());
        info!("  Output: {}", self.output.display());
        info!("  Region size: {}", self.regions.region_size);
        info!("  Threads: {}", self.threading.threads);
        info!("  Phase distance: {}", self.phasing.phase_distance);
        info!("  Output mode: {}", self.output_mode());

        self.validate()?;
        let timer = OperationTimer::new("Phasing candidates");

        let reference = Arc::new(ReferenceReader::new(&self.regions.reference)?);
        let chromosomes = self.regions.select_chromosomes(reference.as_ref())?;

        let table = CandidateTable::new(read_candidates(&self.input)?);
        info!("Loaded {} candidates", table.len());
        for (chromosome, count) in table.unplaced(reference.as_ref()) {
            match reference.sequence_length(&chromosome) {
                Some(length) => warn!(
                    "Skipping {count} candidates on {chromosome} past the sequence end ({length})"
                ),
                None => warn!(
                    "Skipping {count} candidates on {chromosome}, which is not in the reference"
                ),
            }
        }

        let providers = Providers::reference_only(reference, self.threading.partition_size);
        let pipeline =
            ChromosomePipeline::new(self.pipeline_config(), Arc::new(table), providers)?;
        let writer = TsvVariantWriter::to_path(&self.output)?;
        let mut sink = OutputSink::new(self.output_mode(), writer);

        let mut summaries: Vec<ChromosomeSummary> = Vec::with_capacity(chromosomes.len());
        let outcome = chromosomes.iter().try_for_each(|chromosome| -> Result<()> {
            summaries.push(pipeline.process(chromosome, &mut sink)?);
            Ok(())
        });
        // Flush calls written before a failure
        let flushed = sink.finish();
        outcome?;
        flushed?.into_inner()?;

        log_pipeline_summary(&summaries);
        timer.log_completion(summaries.iter().map(|s| s.written).sum());
        Ok(())
    }
}
