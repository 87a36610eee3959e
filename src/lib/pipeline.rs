//! Per-chromosome driver.
//!
//! [`ChromosomePipeline`] wires the pieces together for one chromosome at a time: split the
//! chromosome into regions, submit them all to the scheduler, merge the futures in order through
//! the phaser and inclusion policy, and hand the result to an [`OutputSink`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fgvar_lib::candidates::{CandidateTable, TsvVariantWriter, read_candidates};
//! use fgvar_lib::config::PipelineConfig;
//! use fgvar_lib::pipeline::ChromosomePipeline;
//! use fgvar_lib::providers::Providers;
//! use fgvar_lib::reference::ReferenceReader;
//! use fgvar_lib::sink::OutputSink;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PipelineConfig { threads: 8, ..PipelineConfig::default() };
//! let reference = Arc::new(ReferenceReader::new("ref.fa")?);
//! let providers = Providers::reference_only(reference, config.partition_size);
//! let table = Arc::new(CandidateTable::new(read_candidates("candidates.tsv")?));
//!
//! let pipeline = ChromosomePipeline::new(config.clone(), table, providers)?;
//! let mut sink = OutputSink::new(config.output_mode, TsvVariantWriter::to_path("out.tsv")?);
//! pipeline.process("chr1", &mut sink)?;
//! sink.finish()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::errors::FgvarError;
use crate::filter::{InclusionPolicy, SoftPassPolicy};
use crate::merger::{MergeStats, OrderedMerger};
use crate::phasing::{MergeRule, MnvMergeRule, Phaser};
use crate::progress::RegionProgress;
use crate::providers::Providers;
use crate::region::{GenomicRegion, split_chromosome};
use crate::scheduler::{RegionComputation, RegionScheduler};
use crate::sink::{OutputSink, VariantWriter};

/// What happened on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeSummary {
    pub chromosome: String,
    /// Regions the chromosome was split into
    pub regions: u64,
    /// Merge counters
    pub stats: MergeStats,
    /// Calls written to the sink for this chromosome
    pub written: u64,
    /// Partitions dropped after the chromosome finished
    pub evicted_partitions: usize,
}

/// Runs the region, merge and output stages for one chromosome at a time.
pub struct ChromosomePipeline {
    config: PipelineConfig,
    scheduler: RegionScheduler,
    computation: Arc<dyn RegionComputation>,
    providers: Providers,
    merge_rule: Arc<dyn MergeRule>,
    policy: Arc<dyn InclusionPolicy>,
}

impl ChromosomePipeline {
    /// Builds a pipeline with MNV merging and the soft-pass inclusion policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the worker pool cannot be built.
    pub fn new(
        config: PipelineConfig,
        computation: Arc<dyn RegionComputation>,
        providers: Providers,
    ) -> Result<Self> {
        config.validate()?;
        let scheduler = RegionScheduler::new(config.threads)?;
        let merge_rule = Arc::new(MnvMergeRule::new(Arc::clone(&providers.reference)));
        Ok(Self {
            config,
            scheduler,
            computation,
            providers,
            merge_rule,
            policy: Arc::new(SoftPassPolicy),
        })
    }

    /// Replaces the merge rule applied when the phasing window flushes.
    #[must_use]
    pub fn with_merge_rule(mut self, rule: Arc<dyn MergeRule>) -> Self {
        self.merge_rule = rule;
        self
    }

    /// Replaces the inclusion policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn InclusionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Splits `chromosome` into regions using its reference length.
    ///
    /// # Errors
    ///
    /// Returns [`FgvarError::ReferenceNotFound`] if the reference has no such sequence.
    pub fn regions(&self, chromosome: &str) -> Result<Vec<GenomicRegion>> {
        let length = self
            .providers
            .reference
            .sequence_length(chromosome)
            .ok_or_else(|| FgvarError::ReferenceNotFound { ref_name: chromosome.to_string() })?;
        Ok(split_chromosome(chromosome, length, self.config.region_size)?)
    }

    /// Submits every region of `chromosome` and returns the ordered stream of finalized calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the chromosome cannot be split into regions.
    pub fn merge(&self, chromosome: &str) -> Result<OrderedMerger> {
        Ok(self.merge_regions(chromosome, self.regions(chromosome)?))
    }

    fn merge_regions(&self, chromosome: &str, regions: Vec<GenomicRegion>) -> OrderedMerger {
        let progress = RegionProgress::new(chromosome, regions.len());
        debug!("Processing {chromosome} as {} regions", regions.len());

        let futures = self.scheduler.submit(regions, &self.computation, &self.providers);
        let phaser = Phaser::new(self.config.phase, Arc::clone(&self.merge_rule));
        OrderedMerger::new(futures, phaser, Arc::clone(&self.policy), self.config.filter)
            .with_progress(progress)
    }

    /// Processes one chromosome into `sink`.
    ///
    /// On failure the sink's open chromosome is aborted: buffered output for the chromosome is
    /// discarded, streamed output is kept.
    ///
    /// # Errors
    ///
    /// Returns the first region, ordering, or output error.
    pub fn process<W: VariantWriter>(
        &self,
        chromosome: &str,
        sink: &mut OutputSink<W>,
    ) -> Result<ChromosomeSummary> {
        let regions = self.regions(chromosome)?;
        let region_count = regions.len() as u64;
        let mut merger = self.merge_regions(chromosome, regions);
        let written_before = sink.written();

        let outcome = merger
            .by_ref()
            .try_for_each(|result| -> Result<()> {
                sink.accept(result?)?;
                Ok(())
            })
            .and_then(|()| sink.finish_chromosome().map(|_| ()));
        let evicted_partitions = self.evict(chromosome);

        if let Err(e) = outcome {
            let discarded = sink.abort_chromosome();
            warn!(
                "{chromosome} failed after {} regions, discarded {discarded} buffered calls",
                merger.stats().regions_merged
            );
            return Err(e).with_context(|| format!("Failed to process chromosome {chromosome}"));
        }

        let summary = ChromosomeSummary {
            chromosome: chromosome.to_string(),
            regions: region_count,
            stats: merger.stats(),
            written: sink.written() - written_before,
            evicted_partitions,
        };
        info!("Finished processing chromosome {chromosome}");
        Ok(summary)
    }

    /// Processes each chromosome in turn, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first chromosome's error.
    pub fn process_all<W: VariantWriter>(
        &self,
        chromosomes: &[String],
        sink: &mut OutputSink<W>,
    ) -> Result<Vec<ChromosomeSummary>> {
        chromosomes.iter().map(|chromosome| self.process(chromosome, sink)).collect()
    }

    fn evict(&self, chromosome: &str) -> usize {
        if !self.config.evict_partitions {
            return 0;
        }
        let evicted = self.providers.partitions.evict_chromosome(chromosome);
        if evicted > 0 {
            debug!("Evicted {evicted} partitions for {chromosome}");
        }
        evicted
    }
}

impl std::fmt::Debug for ChromosomePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromosomePipeline")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
