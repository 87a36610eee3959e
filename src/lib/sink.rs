//! Output of finalized calls.
//!
//! The [`OutputSink`] sits between the merger and a [`VariantWriter`]. In
//! [`OutputMode::Streaming`] each call is written as soon as it arrives, so output appears while
//! later regions are still being computed. In [`OutputMode::Buffered`] a chromosome's calls are
//! held until the chromosome is finished, sorted, and then written together; an aborted
//! chromosome writes nothing.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use log::debug;

use crate::errors::FgvarError;
use crate::variant::CandidateVariant;

/// How the sink hands calls to its writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Write each call immediately, in the order received
    Streaming,
    /// Hold a chromosome's calls, sort them, and write them when the chromosome finishes
    #[default]
    Buffered,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Streaming => write!(f, "streaming"),
            OutputMode::Buffered => write!(f, "buffered"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = FgvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "streaming" | "stream" | "unsorted" => Ok(OutputMode::Streaming),
            "buffered" | "sorted" => Ok(OutputMode::Buffered),
            other => Err(FgvarError::InvalidParameter {
                parameter: "output-mode".to_string(),
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Destination for finalized calls.
pub trait VariantWriter {
    /// Writes one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the call cannot be written.
    fn write(&mut self, variant: &CandidateVariant) -> Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finish(&mut self) -> Result<()>;
}

impl VariantWriter for Vec<CandidateVariant> {
    fn write(&mut self, variant: &CandidateVariant) -> Result<()> {
        self.push(variant.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Routes finalized calls to a writer in streaming or buffered mode.
#[derive(Debug)]
pub struct OutputSink<W: VariantWriter> {
    mode: OutputMode,
    writer: W,
    buffer: Vec<CandidateVariant>,
    chromosome: Option<String>,
    last_position: Option<u32>,
    written: u64,
}

impl<W: VariantWriter> OutputSink<W> {
    #[must_use]
    pub fn new(mode: OutputMode, writer: W) -> Self {
        Self {
            mode,
            writer,
            buffer: Vec::new(),
            chromosome: None,
            last_position: None,
            written: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Calls handed to the writer so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Calls held for the open chromosome (always zero when streaming).
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Accepts the next call. A call on a new chromosome finishes the open one first.
    ///
    /// # Errors
    ///
    /// Returns [`FgvarError::OrderingViolation`] if streaming and the call is positioned before
    /// the previous call on the same chromosome, or any error from the writer.
    pub fn accept(&mut self, variant: CandidateVariant) -> Result<()> {
        if self.chromosome.as_deref() != Some(variant.chromosome.as_str()) {
            if self.chromosome.is_some() {
                self.finish_chromosome()?;
            }
            self.chromosome = Some(variant.chromosome.clone());
        }

        match self.mode {
            OutputMode::Streaming => {
                if let Some(last) = self.last_position.filter(|last| variant.position < *last) {
                    return Err(FgvarError::OrderingViolation {
                        context: "output".to_string(),
                        reason: format!("{variant} written after position {last}"),
                    }
                    .into());
                }
                self.last_position = Some(variant.position);
                self.writer.write(&variant)?;
                self.written += 1;
            }
            OutputMode::Buffered => self.buffer.push(variant),
        }
        Ok(())
    }

    /// Completes the open chromosome, writing its buffered calls in sorted order.
    ///
    /// Returns the number of calls written by this call.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn finish_chromosome(&mut self) -> Result<u64> {
        let mut calls = std::mem::take(&mut self.buffer);
        calls.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.ref_allele.cmp(&b.ref_allele))
                .then_with(|| a.alt_allele.cmp(&b.alt_allele))
        });
        for variant in &calls {
            self.writer.write(variant)?;
        }
        let count = calls.len() as u64;
        self.written += count;

        if let Some(chromosome) = self.chromosome.take() {
            debug!("Wrote {count} buffered calls for {chromosome}");
        }
        self.last_position = None;
        Ok(count)
    }

    /// Abandons the open chromosome after a failure.
    ///
    /// Buffered calls are discarded and their count returned; calls already streamed stay
    /// written.
    pub fn abort_chromosome(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.chromosome = None;
        self.last_position = None;
        discarded
    }

    /// Finishes any open chromosome, flushes the writer and returns it.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn finish(mut self) -> Result<W> {
        if self.chromosome.is_some() {
            self.finish_chromosome()?;
        }
        self.writer.finish()?;
        Ok(self.writer)
    }
}
