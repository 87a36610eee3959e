//! Write the region layout used by `phase` as a BED file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fgvar_lib::logging::OperationTimer;
use fgvar_lib::providers::ReferenceProvider;
use fgvar_lib::reference::ReferenceReader;
use fgvar_lib::region::{GenomicRegion, split_chromosome};
use fgvar_lib::validation::validate_output_dir;

use super::command::Command;
use super::common::RegionOptions;

/// Writes the regions each chromosome is split into.
#[derive(Parser, Debug)]
#[command(
    name = "regions",
    author,
    version,
    about = "\x1b[38;5;72m[UTILITIES]\x1b[0m   \x1b[36mWrite the region layout as a BED file\x1b[0m",
    long_about = r#"
Splits every reference sequence (or those given with `--chromosomes`) into consecutive regions of
`--region-size` bases, exactly as `phase` does, and writes them as BED intervals in reference
order. The last region of each chromosome is truncated at the chromosome end.
"#
)]
pub struct Regions {
    /// Output BED file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    #[command(flatten)]
    pub regions: RegionOptions,
}

impl Regions {
    /// Regions for every selected chromosome, in reference order.
    fn layout(&self, reference: &dyn ReferenceProvider) -> Result<Vec<GenomicRegion>> {
        let mut regions = Vec::new();
        for chromosome in self.regions.select_chromosomes(reference)? {
            let length = reference.sequence_length(&chromosome).unwrap_or(0);
            regions.extend(split_chromosome(&chromosome, length, self.regions.region_size)?);
        }
        Ok(regions)
    }
}

impl Command for Regions {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("Regions");
        info!("  Command line: {command_line}");
        info!("  Reference: {}", self.regions.reference.display());
        info!("  Output: {}", self.output.display());
        info!("  Region size: {}", self.regions.region_size);

        self.regions.validate()?;
        validate_output_dir(&self.output, "Output BED")?;
        let timer = OperationTimer::new("Writing regions");

        let reference = ReferenceReader::new(&self.regions.reference)?;
        let regions = self.layout(&reference)?;

        let file = File::create(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        let mut writer = BufWriter::new(file);
        for region in &regions {
            writeln!(writer, "{}", region.to_bed_line())?;
        }
        writer.flush()?;

        timer.log_completion(regions.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgvar_lib::providers::InMemoryReference;

    #[test]
    fn test_layout_covers_selected_chromosomes() {
        let reference = InMemoryReference::new()
            .with_sequence("chr1", vec![b'A'; 25])
            .with_sequence("chr2", vec![b'C'; 10])
            .with_sequence("chr3", vec![b'G'; 5]);
        let command = Regions::parse_from([
            "regions",
            "-r",
            "ref.fa",
            "-o",
            "out.bed",
            "--region-size",
            "10",
            "--chromosomes",
            "chr1",
            "chr3",
        ]);

        let lines: Vec<_> =
            command.layout(&reference).unwrap().iter().map(|r| r.to_bed_line()).collect();
        assert_eq!(lines, vec!["chr1\t0\t10", "chr1\t10\t20", "chr1\t20\t25", "chr3\t0\t5"]);
    }
}
