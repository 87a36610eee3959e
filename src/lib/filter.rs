//! Inclusion decisions applied to phased calls.
//!
//! The scoring that sets filter flags happens upstream; this module only decides which flagged
//! or unflagged calls reach the output. Policies run after phasing, so they always see merged
//! calls rather than the raw inputs.

use crate::variant::CandidateVariant;

/// Default maximum non-target alt support for a soft-filtered call to be kept.
pub const DEFAULT_HARD_MAX_NORMAL_ALT_SUPPORT: u32 = 8;

/// Filtering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Drop every call that carries a filter flag
    pub hard_filter: bool,
    /// Soft-filtered calls are kept only while their non-target alt support is at most this
    pub hard_max_normal_alt_support: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hard_filter: false,
            hard_max_normal_alt_support: DEFAULT_HARD_MAX_NORMAL_ALT_SUPPORT,
        }
    }
}

/// Decides whether a finalized call is written.
///
/// Closures of the form `Fn(&CandidateVariant, &FilterConfig) -> bool` are policies.
pub trait InclusionPolicy: Send + Sync {
    fn include(&self, variant: &CandidateVariant, config: &FilterConfig) -> bool;
}

impl<F> InclusionPolicy for F
where
    F: Fn(&CandidateVariant, &FilterConfig) -> bool + Send + Sync,
{
    fn include(&self, variant: &CandidateVariant, config: &FilterConfig) -> bool {
        self(variant, config)
    }
}

/// Keeps passing calls, plus soft-filtered calls with little non-target support unless hard
/// filtering is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftPassPolicy;

impl InclusionPolicy for SoftPassPolicy {
    fn include(&self, variant: &CandidateVariant, config: &FilterConfig) -> bool {
        if variant.is_passing() {
            return true;
        }
        !config.hard_filter
            && variant.max_non_target_alt_support() <= config.hard_max_normal_alt_support
    }
}
