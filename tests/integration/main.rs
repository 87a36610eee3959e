//! Integration tests for the fgvar library and CLI.
//!
//! These tests validate end-to-end workflows that span multiple modules,
//! ensuring that module interactions work correctly.

mod helpers;
mod test_ordering;
mod test_partial_failure;
mod test_partition_store;
mod test_phase_command;
mod test_phasing;
