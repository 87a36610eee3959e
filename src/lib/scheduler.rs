//! Parallel execution of region tasks.
//!
//! The [`RegionScheduler`] owns a fixed-size rayon pool. [`RegionScheduler::submit`] dispatches
//! every region at once and hands back one [`RegionFuture`] per region, in submission order.
//! Each future is a one-shot channel slot the worker fills when its computation finishes, so the
//! consumer can wait on region `i` while regions `i + 1..` keep running.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use log::{debug, warn};

use crate::errors::{FgvarError, Result};
use crate::providers::Providers;
use crate::region::GenomicRegion;
use crate::variant::CandidateVariant;

/// Computes candidate variants for one region.
///
/// Implementations must be deterministic for a given region and return variants sorted by
/// position. Any closure with the matching signature is a computation:
///
/// ```
/// use fgvar_lib::providers::Providers;
/// use fgvar_lib::region::GenomicRegion;
/// use fgvar_lib::scheduler::RegionComputation;
/// use fgvar_lib::variant::CandidateVariant;
///
/// fn assert_computation(_: &impl RegionComputation) {}
/// let none = |_region: &GenomicRegion, _providers: &Providers| {
///     Ok::<Vec<CandidateVariant>, anyhow::Error>(Vec::new())
/// };
/// assert_computation(&none);
/// ```
pub trait RegionComputation: Send + Sync {
    /// Computes the candidates for `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be processed; the error is surfaced by the merger
    /// when the region's turn comes.
    fn compute(
        &self,
        region: &GenomicRegion,
        providers: &Providers,
    ) -> anyhow::Result<Vec<CandidateVariant>>;
}

impl<F> RegionComputation for F
where
    F: Fn(&GenomicRegion, &Providers) -> anyhow::Result<Vec<CandidateVariant>> + Send + Sync,
{
    fn compute(
        &self,
        region: &GenomicRegion,
        providers: &Providers,
    ) -> anyhow::Result<Vec<CandidateVariant>> {
        self(region, providers)
    }
}

enum Slot {
    Pending(Receiver<Result<Vec<CandidateVariant>>>),
    Ready(Result<Vec<CandidateVariant>>),
}

/// Handle to the eventual result of one region task.
pub struct RegionFuture {
    region: GenomicRegion,
    slot: Slot,
}

impl RegionFuture {
    /// Builds a future that is already resolved.
    #[must_use]
    pub fn ready(region: GenomicRegion, result: Result<Vec<CandidateVariant>>) -> Self {
        Self { region, slot: Slot::Ready(result) }
    }

    /// The region this future computes.
    #[must_use]
    pub fn region(&self) -> &GenomicRegion {
        &self.region
    }

    /// Returns true once the task has finished, without blocking.
    pub fn is_ready(&mut self) -> bool {
        let Slot::Pending(receiver) = &self.slot else {
            return true;
        };
        match receiver.try_recv() {
            Ok(result) => {
                self.slot = Slot::Ready(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.slot = Slot::Ready(Err(abandoned(&self.region)));
                true
            }
        }
    }

    /// Blocks until the task finishes and returns its variants.
    ///
    /// # Errors
    ///
    /// Returns [`FgvarError::RegionComputation`] if the computation failed, panicked, or its
    /// worker went away without producing a result.
    pub fn wait(self) -> Result<Vec<CandidateVariant>> {
        match self.slot {
            Slot::Ready(result) => result,
            Slot::Pending(receiver) => {
                receiver.recv().unwrap_or_else(|_| Err(abandoned(&self.region)))
            }
        }
    }
}

impl std::fmt::Debug for RegionFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.slot {
            Slot::Pending(_) => "pending",
            Slot::Ready(Ok(_)) => "done",
            Slot::Ready(Err(_)) => "failed",
        };
        write!(f, "RegionFuture({}, {state})", self.region)
    }
}

fn abandoned(region: &GenomicRegion) -> FgvarError {
    FgvarError::RegionComputation {
        region: region.to_string(),
        reason: "worker exited without producing a result".to_string(),
    }
}

/// Extract a human-readable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Dispatches region tasks to a fixed-size worker pool.
pub struct RegionScheduler {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl RegionScheduler {
    /// Creates a scheduler with `threads` named worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if `threads` is zero or the pool cannot be built.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(FgvarError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fgvar-region-{i}"))
            .build()
            .map_err(|e| FgvarError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: format!("failed to build worker pool: {e}"),
            })?;
        Ok(Self { pool, threads })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Submits every region at once, returning one future per region in input order.
    ///
    /// Completion order is unconstrained. A computation that errors or panics resolves its own
    /// future to [`FgvarError::RegionComputation`] and does not affect the others.
    pub fn submit<C>(
        &self,
        regions: Vec<GenomicRegion>,
        computation: &Arc<C>,
        providers: &Providers,
    ) -> Vec<RegionFuture>
    where
        C: RegionComputation + ?Sized + 'static,
    {
        debug!("Submitting {} regions to {} worker threads", regions.len(), self.threads);

        regions
            .into_iter()
            .map(|region| {
                let (sender, receiver) = bounded(1);
                let computation = Arc::clone(computation);
                let providers = providers.clone();
                let task_region = region.clone();

                self.pool.spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        computation.compute(&task_region, &providers)
                    }));
                    let result = match outcome {
                        Ok(Ok(variants)) => Ok(variants),
                        Ok(Err(e)) => {
                            warn!("Region {task_region} failed: {e:#}");
                            Err(FgvarError::RegionComputation {
                                region: task_region.to_string(),
                                reason: format!("{e:#}"),
                            })
                        }
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            warn!("Region {task_region} panicked: {message}");
                            Err(FgvarError::RegionComputation {
                                region: task_region.to_string(),
                                reason: format!("panicked: {message}"),
                            })
                        }
                    };
                    // The merger drops later futures after a failure, so nobody may be listening
                    let _ = sender.send(result);
                });

                RegionFuture { region, slot: Slot::Pending(receiver) }
            })
            .collect()
    }
}

impl std::fmt::Debug for RegionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegionScheduler(threads={})", self.threads)
    }
}
