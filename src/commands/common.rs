//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use clap::Args;

use fgvar_lib::config::{DEFAULT_PARTITION_SIZE, DEFAULT_REGION_SIZE};
use fgvar_lib::errors::FgvarError;
use fgvar_lib::filter::{DEFAULT_HARD_MAX_NORMAL_ALT_SUPPORT, FilterConfig};
use fgvar_lib::phasing::{DEFAULT_MAX_WINDOW, DEFAULT_PHASE_DISTANCE, PhaseConfig};
use fgvar_lib::providers::ReferenceProvider;
use fgvar_lib::validation::{validate_file_exists, validate_positive};

/// Reference and region layout options.
#[derive(Debug, Clone, Args)]
pub struct RegionOptions {
    /// Reference FASTA file
    #[arg(short = 'r', long = "ref")]
    pub reference: PathBuf,

    /// Size in bases of each region processed as one task
    #[arg(long = "region-size", default_value_t = DEFAULT_REGION_SIZE)]
    pub region_size: u32,

    /// Only process these chromosomes (default: every reference sequence)
    #[arg(long = "chromosomes", num_args = 1..)]
    pub chromosomes: Vec<String>,
}

impl RegionOptions {
    /// Validates that the reference exists and the region size is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is missing or the region size is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_file_exists(&self.reference, "Reference FASTA")?;
        validate_positive(self.region_size, "region-size")?;
        Ok(())
    }

    /// Chromosomes to process, in reference order.
    ///
    /// # Errors
    ///
    /// Returns an error if a requested chromosome is not in the reference.
    pub fn select_chromosomes(
        &self,
        reference: &dyn ReferenceProvider,
    ) -> anyhow::Result<Vec<String>> {
        let names = reference.sequence_names();
        if let Some(missing) = self.chromosomes.iter().find(|c| !names.contains(c)) {
            return Err(FgvarError::ReferenceNotFound { ref_name: missing.clone() }.into());
        }
        if self.chromosomes.is_empty() {
            return Ok(names);
        }
        Ok(names.into_iter().filter(|name| self.chromosomes.contains(name)).collect())
    }
}

/// Worker pool options.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of threads computing regions
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Size in bases of each partition of shared state
    #[arg(long = "partition-size", default_value_t = DEFAULT_PARTITION_SIZE)]
    pub partition_size: u32,
}

/// Phasing window options.
#[derive(Debug, Clone, Args)]
pub struct PhasingOptions {
    /// Maximum gap in bases between substitutions that may be merged
    #[arg(long = "phase-distance", default_value_t = DEFAULT_PHASE_DISTANCE)]
    pub phase_distance: u32,

    /// Maximum number of calls held in the phasing window
    #[arg(long = "max-phase-window", default_value_t = DEFAULT_MAX_WINDOW)]
    pub max_phase_window: usize,
}

impl PhasingOptions {
    #[must_use]
    pub fn to_config(&self) -> PhaseConfig {
        PhaseConfig { distance: self.phase_distance, max_window: self.max_phase_window }
    }
}

/// Inclusion options.
#[derive(Debug, Clone, Args)]
pub struct FilterOptions {
    /// Drop every call that carries a filter flag
    #[arg(long = "hard-filter", default_value = "false")]
    pub hard_filter: bool,

    /// Keep soft-filtered calls only while non-target alt support is at most this
    #[arg(
        long = "hard-max-normal-alt-support",
        default_value_t = DEFAULT_HARD_MAX_NORMAL_ALT_SUPPORT
    )]
    pub hard_max_normal_alt_support: u32,
}

impl FilterOptions {
    #[must_use]
    pub fn to_config(&self) -> FilterConfig {
        FilterConfig {
            hard_filter: self.hard_filter,
            hard_max_normal_alt_support: self.hard_max_normal_alt_support,
        }
    }
}
