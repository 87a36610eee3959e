//! Pipeline configuration.

use crate::errors::Result;
use crate::filter::FilterConfig;
use crate::phasing::PhaseConfig;
use crate::sink::OutputMode;
use crate::validation::validate_positive;

/// Default region size in bases.
pub const DEFAULT_REGION_SIZE: u32 = 100_000;

/// Default partition size in bases.
pub const DEFAULT_PARTITION_SIZE: u32 = 1_000_000;

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Bases per region task
    pub region_size: u32,
    /// Bases per partition of shared state
    pub partition_size: u32,
    /// Worker threads computing regions
    pub threads: usize,
    /// Phasing window settings
    pub phase: PhaseConfig,
    /// Inclusion settings
    pub filter: FilterConfig,
    /// Streaming or buffered output
    pub output_mode: OutputMode,
    /// Drop a chromosome's partitions once it has been merged
    pub evict_partitions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            partition_size: DEFAULT_PARTITION_SIZE,
            threads: 1,
            phase: PhaseConfig::default(),
            filter: FilterConfig::default(),
            output_mode: OutputMode::default(),
            evict_partitions: true,
        }
    }
}

impl PipelineConfig {
    /// Checks that every size and count is usable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::FgvarError::InvalidParameter`] naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.region_size, "region-size")?;
        validate_positive(self.partition_size, "partition-size")?;
        validate_positive(self.threads, "threads")?;
        validate_positive(self.phase.max_window, "max-phase-window")?;
        Ok(())
    }
}
