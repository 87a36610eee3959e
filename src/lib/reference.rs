//! Reference genome FASTA reading with all sequences loaded into memory.
//!
//! [`ReferenceReader`] is the file-backed [`ReferenceProvider`]: region tasks and the phasing
//! merge rule fetch reference bases from it concurrently, so the whole reference is read once
//! up front and shared behind an `Arc`.
//!
//! When a `.fai` index sits next to the FASTA, sequences are read as raw bytes at the indexed
//! offsets with line terminators stripped in memory; otherwise the file is parsed sequentially
//! with noodles.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use noodles::fasta::fai;

use crate::errors::FgvarError;
use crate::providers::{ReferenceProvider, slice_sequence};

/// Read a sequence from a FASTA file using FAI index metadata.
///
/// Reads the whole sequence span in one call, then strips line terminators in memory.
fn read_sequence_raw(file: &mut File, record: &fai::Record) -> Result<Vec<u8>> {
    let line_bases = record.line_bases() as usize;
    let line_width = record.line_width() as usize;
    let seq_len = record.length() as usize;

    file.seek(SeekFrom::Start(record.offset()))?;

    if seq_len <= line_bases {
        let mut sequence = vec![0u8; seq_len];
        file.read_exact(&mut sequence)?;
        return Ok(sequence);
    }

    let full_lines = seq_len / line_bases;
    let tail = seq_len % line_bases;
    let span = if tail > 0 {
        full_lines * line_width + tail
    } else {
        (full_lines - 1) * line_width + line_bases
    };

    let mut raw = vec![0u8; span];
    file.read_exact(&mut raw)?;

    let terminator_len = line_width - line_bases;
    let mut sequence = Vec::with_capacity(seq_len);
    let mut pos = 0;
    while sequence.len() < seq_len && pos < raw.len() {
        let take = (seq_len - sequence.len()).min(line_bases).min(raw.len() - pos);
        sequence.extend_from_slice(&raw[pos..pos + take]);
        pos += take + terminator_len;
    }

    Ok(sequence)
}

/// Find the FAI index for a FASTA file, trying `ref.fa.fai` then `<path>.fai`.
fn find_fai_path(fasta_path: &Path) -> Option<PathBuf> {
    let candidate = fasta_path.with_extension("fa.fai");
    if candidate.exists() {
        return Some(candidate);
    }
    let candidate = PathBuf::from(format!("{}.fai", fasta_path.display()));
    candidate.exists().then_some(candidate)
}

/// A thread-safe reference genome with every sequence preloaded.
#[derive(Clone)]
pub struct ReferenceReader {
    /// Sequence names in file order
    names: Arc<Vec<String>>,
    /// Sequences keyed by name, case preserved
    sequences: Arc<HashMap<String, Vec<u8>>>,
}

impl ReferenceReader {
    /// Loads a reference FASTA into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed as FASTA.
    ///
    /// # Examples
    /// ```no_run
    /// use fgvar_lib::providers::ReferenceProvider;
    /// use fgvar_lib::reference::ReferenceReader;
    ///
    /// let reference = ReferenceReader::new("reference.fasta")?;
    /// let base = reference.base_at("chr1", 1000)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FgvarError::InvalidFileFormat {
                file_type: "Reference FASTA".to_string(),
                path: path.display().to_string(),
                reason: "File does not exist".to_string(),
            }
            .into());
        }

        debug!("Reading reference FASTA into memory: {}", path.display());
        match find_fai_path(path) {
            Some(fai_path) => {
                debug!("Using FAI index: {}", fai_path.display());
                Self::new_with_fai(path, &fai_path)
            }
            None => Self::new_sequential(path),
        }
    }

    fn new_with_fai(fasta_path: &Path, fai_path: &Path) -> Result<Self> {
        let index = fai::fs::read(fai_path)
            .with_context(|| format!("Failed to read FAI index: {}", fai_path.display()))?;
        let records: &[fai::Record] = index.as_ref();
        let mut file = File::open(fasta_path)
            .with_context(|| format!("Failed to open FASTA: {}", fasta_path.display()))?;

        let mut names = Vec::with_capacity(records.len());
        let mut sequences = HashMap::with_capacity(records.len());
        for record in records {
            let name = String::from_utf8_lossy(record.name().as_ref()).into_owned();
            let sequence = read_sequence_raw(&mut file, record)
                .with_context(|| format!("Failed to read sequence {name}"))?;
            names.push(name.clone());
            sequences.insert(name, sequence);
        }

        debug!("Loaded {} contigs (FAI-indexed)", sequences.len());
        Ok(Self { names: Arc::new(names), sequences: Arc::new(sequences) })
    }

    fn new_sequential(path: &Path) -> Result<Self> {
        use noodles::fasta;

        let mut reader = fasta::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open FASTA: {}", path.display()))?;

        let mut names = Vec::new();
        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record = result?;
            let name = std::str::from_utf8(record.name())?.to_string();
            let bases: &[u8] = record.sequence().as_ref();
            names.push(name.clone());
            sequences.insert(name, bases.to_vec());
        }

        debug!("Loaded {} contigs (sequential)", sequences.len());
        Ok(Self { names: Arc::new(names), sequences: Arc::new(sequences) })
    }
}

impl ReferenceProvider for ReferenceReader {
    fn fetch(&self, chromosome: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let sequence = self
            .sequences
            .get(chromosome)
            .ok_or_else(|| FgvarError::ReferenceNotFound { ref_name: chromosome.to_string() })?;
        slice_sequence(chromosome, sequence, start, end)
    }

    fn sequence_length(&self, chromosome: &str) -> Option<u32> {
        self.sequences.get(chromosome).and_then(|s| u32::try_from(s.len()).ok())
    }

    fn sequence_names(&self) -> Vec<String> {
        self.names.as_ref().clone()
    }
}
