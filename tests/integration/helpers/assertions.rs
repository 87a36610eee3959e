//! Custom assertion helpers for integration tests.

#![allow(dead_code)]

use fgvar_lib::variant::CandidateVariant;

/// Positions of `calls`, in order.
pub fn positions(calls: &[CandidateVariant]) -> Vec<u32> {
    calls.iter().map(|v| v.position).collect()
}

/// Asserts that positions never decrease within a chromosome.
///
/// # Panics
///
/// Panics at the first call that goes backwards.
pub fn assert_coordinate_sorted(calls: &[CandidateVariant]) {
    for pair in calls.windows(2) {
        if pair[0].chromosome == pair[1].chromosome {
            assert!(
                pair[0].position <= pair[1].position,
                "{} is written after {}",
                pair[1],
                pair[0]
            );
        }
    }
}

/// Asserts that `call` is an MNV spanning `position` with the given alleles.
///
/// # Panics
///
/// Panics if any field differs.
pub fn assert_mnv(call: &CandidateVariant, position: u32, ref_allele: &str, alt_allele: &str) {
    assert_eq!(call.position, position, "position of {call}");
    assert_eq!(String::from_utf8_lossy(&call.ref_allele), ref_allele, "REF of {call}");
    assert_eq!(String::from_utf8_lossy(&call.alt_allele), alt_allele, "ALT of {call}");
}
