//! CLI command implementations for fgvar.
//!
//! # Commands
//!
//! - [`phase`] - Phase a candidate table into multi-nucleotide variants
//! - [`regions`] - Write the region layout as a BED file

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod phase;
pub mod regions;
