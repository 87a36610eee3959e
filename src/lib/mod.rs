#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: Coordinates and counters move between u32, u64 and usize
// - missing_*_doc: Documentation improvements tracked separately
// - needless_pass_by_value: Some APIs designed for ownership transfer
// - items_after_statements: Some test code uses late item declarations
// - unused_self: Trait implementations may not use self
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::unused_self,
    clippy::module_name_repetitions,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

//! # fgvar - partitioned variant phasing
//!
//! This library splits each chromosome into fixed-size regions, computes candidate variant calls
//! for every region in parallel, and merges the per-region results back into a single
//! positionally ordered stream. While merging, nearby substitutions are phased into
//! multi-nucleotide variants before the inclusion policy decides what is written.
//!
//! ## Overview
//!
//! ### Pipeline stages
//!
//! - **[`scheduler`]** - Submits every region of a chromosome to a worker pool
//! - **[`merger`]** - Waits on regions in submission order and streams finalized calls
//! - **[`phasing`]** - Window state machine that combines phased substitutions
//! - **[`filter`]** - Inclusion policies applied after phasing
//! - **[`sink`]** - Streaming or per-chromosome sorted output
//! - **[`pipeline`]** - Runs the stages for one chromosome at a time
//!
//! ### Shared state
//!
//! - **[`partition`]** - Sharded store of per-partition state shared by region tasks
//! - **[`providers`]** - Reference and read sources handed to region computations
//!
//! ### Utilities
//!
//! - **[`candidates`]** - Candidate TSV input and output
//! - **[`reference`][mod@reference]** - FASTA loading
//! - **[`validation`]** - Input validation utilities for parameters and files
//! - **[`progress`]** - Merge progress logging
//! - **[`logging`]** - Formatting helpers and run summaries
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use fgvar_lib::config::PipelineConfig;
//! use fgvar_lib::pipeline::ChromosomePipeline;
//! use fgvar_lib::providers::{InMemoryReference, Providers};
//! use fgvar_lib::region::GenomicRegion;
//! use fgvar_lib::sink::{OutputMode, OutputSink};
//! use fgvar_lib::variant::CandidateVariant;
//!
//! # fn main() -> anyhow::Result<()> {
//! let reference = InMemoryReference::new().with_sequence("chr1", "ACGTACGTAC".repeat(300));
//! let providers = Providers::reference_only(Arc::new(reference), 1_000);
//!
//! // One candidate at the start of every region
//! let caller = |region: &GenomicRegion, _: &Providers| -> anyhow::Result<Vec<CandidateVariant>> {
//!     Ok(vec![CandidateVariant::new(region.chromosome(), region.start(), b"A", b"G")])
//! };
//!
//! let config = PipelineConfig { region_size: 1_000, threads: 2, ..PipelineConfig::default() };
//! let pipeline = ChromosomePipeline::new(config, Arc::new(caller), providers)?;
//! let mut sink = OutputSink::new(OutputMode::Buffered, Vec::new());
//! pipeline.process("chr1", &mut sink)?;
//!
//! let calls = sink.finish()?;
//! assert_eq!(calls.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## See Also
//!
//! - [noodles](https://github.com/zaeleus/noodles) - Rust bioinformatics I/O

pub mod candidates;
pub mod config;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod merger;
pub mod partition;
pub mod phasing;
pub mod pipeline;
pub mod progress;
pub mod providers;
pub mod reference;
pub mod region;
pub mod scheduler;
pub mod sink;
pub mod validation;
pub mod variant;
