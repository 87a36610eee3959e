//! Phasing of nearby candidate calls.
//!
//! The [`Phaser`] is a small state machine fed one variant at a time in ascending position
//! order. Variants close to the previous one are held back in a window; when a variant arrives
//! too far away (or the window is full, or the chromosome changes) the window is flushed through
//! a [`MergeRule`], which may combine neighbouring calls before they are released.
//!
//! ```text
//!            push (near)                 push (far) / full / flush()
//!   Empty ──────────────▶ Accumulating ───────────────────────────▶ Flushing ──▶ Empty
//!     ▲                     │    ▲                                               │
//!     │                     └────┘ push (near)                                   │
//!     └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Positions must never go backwards: a variant before the last pending or last emitted
//! position is an ordering violation.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{trace, warn};

use crate::errors::{FgvarError, Result};
use crate::variant::CandidateVariant;

pub mod merge_rule;

pub use merge_rule::{MergeRule, MnvMergeRule, NoMerge};

/// Default maximum gap, in bases, between calls that may interact.
pub const DEFAULT_PHASE_DISTANCE: u32 = 10;

/// Default maximum number of calls held in one window.
pub const DEFAULT_MAX_WINDOW: usize = 64;

/// Phasing window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseConfig {
    /// Maximum `next.position - previous.end()` for calls to share a window
    pub distance: u32,
    /// Maximum number of calls held before a forced flush
    pub max_window: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self { distance: DEFAULT_PHASE_DISTANCE, max_window: DEFAULT_MAX_WINDOW }
    }
}

/// Where the phaser is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// No calls pending
    Empty,
    /// Holding calls that may still interact with the next one
    Accumulating,
    /// Releasing the window (only observable from inside a merge rule)
    Flushing,
}

/// Order-sensitive phasing state machine.
pub struct Phaser {
    config: PhaseConfig,
    rule: Arc<dyn MergeRule>,
    state: PhaseState,
    window: VecDeque<CandidateVariant>,
    chromosome: Option<String>,
    last_emitted: Option<u32>,
    merges: u64,
}

impl Phaser {
    #[must_use]
    pub fn new(config: PhaseConfig, rule: Arc<dyn MergeRule>) -> Self {
        Self {
            config,
            rule,
            state: PhaseState::Empty,
            window: VecDeque::with_capacity(config.max_window.max(1)),
            chromosome: None,
            last_emitted: None,
            merges: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Number of calls currently held back.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    /// Number of pairwise merges performed so far.
    #[must_use]
    pub fn merges(&self) -> u64 {
        self.merges
    }

    /// Position of the most recently released call on the current chromosome.
    #[must_use]
    pub fn last_emitted(&self) -> Option<u32> {
        self.last_emitted
    }

    /// Adds a call, returning any calls finalized as a result.
    ///
    /// # Errors
    ///
    /// Returns [`FgvarError::OrderingViolation`] if `variant` is positioned before a pending or
    /// already released call on the same chromosome, or any error from the merge rule.
    pub fn push(&mut self, variant: CandidateVariant) -> Result<Vec<CandidateVariant>> {
        let mut released = Vec::new();

        if self.chromosome.as_deref() != Some(variant.chromosome.as_str()) {
            released = self.flush()?;
            self.chromosome = Some(variant.chromosome.clone());
            self.last_emitted = None;
        } else {
            self.check_order(&variant)?;
            if let Some(last) = self.window.back() {
                let near = variant.position.saturating_sub(last.end()) <= self.config.distance;
                if !near || self.window.len() >= self.config.max_window {
                    released = self.flush()?;
                }
            }
        }

        trace!("Phasing window accepts {variant}");
        self.window.push_back(variant);
        self.state = PhaseState::Accumulating;
        Ok(released)
    }

    fn check_order(&self, variant: &CandidateVariant) -> Result<()> {
        let floor = self.window.back().map(|v| v.position).or(self.last_emitted);
        match floor {
            Some(floor) if variant.position < floor => Err(FgvarError::OrderingViolation {
                context: "phasing".to_string(),
                reason: format!("{variant} arrived after position {floor}"),
            }),
            _ => Ok(()),
        }
    }

    /// Releases every pending call, applying the merge rule left to right.
    ///
    /// A pair the merge rule fails on is released unmerged, so every pending call is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the merge rule returns a fatal error; the window is cleared
    /// regardless.
    pub fn flush(&mut self) -> Result<Vec<CandidateVariant>> {
        if self.window.is_empty() {
            self.state = PhaseState::Empty;
            return Ok(Vec::new());
        }

        self.state = PhaseState::Flushing;
        let result = self.merge_window();
        self.window.clear();
        self.state = PhaseState::Empty;

        let released = result?;
        if let Some(last) = released.iter().map(|v| v.position).max() {
            self.last_emitted = Some(self.last_emitted.map_or(last, |prev| prev.max(last)));
        }
        Ok(released)
    }

    fn merge_window(&mut self) -> Result<Vec<CandidateVariant>> {
        let mut released = Vec::with_capacity(self.window.len());
        let mut calls = self.window.drain(..);
        let Some(mut current) = calls.next() else {
            return Ok(released);
        };

        for next in calls {
            match self.rule.try_merge(&current, &next, self.config.distance) {
                Ok(Some(merged)) => {
                    trace!("Merged {current} and {next} into {merged}");
                    self.merges += 1;
                    current = merged;
                }
                Ok(None) => released.push(std::mem::replace(&mut current, next)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Releasing {current} and {next} unmerged: {e}");
                    released.push(std::mem::replace(&mut current, next));
                }
            }
        }
        released.push(current);
        Ok(released)
    }
}

impl std::fmt::Debug for Phaser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phaser")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("pending", &self.window.len())
            .field("last_emitted", &self.last_emitted)
            .finish_non_exhaustive()
    }
}
