//! `AsyncPipelineTracker`: bounded per-tick integration of long-running
//! async jobs (spec §4.8, the `AsyncPoll` phase).
//!
//! A job is a coroutine that may span many frames (asset streaming, network
//! round-trips); the tracker never awaits it directly on the coordinator
//! task. Instead the producer sets `ready` once its work is done, and
//! `AsyncPoll` integrates at most `async_budget_per_tick` ready jobs per
//! frame (spec's bounded-integration requirement), discarding any job whose
//! `generation` no longer matches its resource handle's current generation
//! in the registry — the resource it was computing for has since been
//! reloaded or freed out from under it.
//!
//! Grounded in the teacher's `assets::server` pipeline, where
//! `tokio::task::spawn_blocking` decode jobs are tracked by handle and
//! integrated back into the asset store once complete; this tracker
//! generalizes that handle-keyed completion tracking to arbitrary
//! orchestrator-driven async work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use slotmap::{SlotMap, new_key_type};
use tokio_util::sync::CancellationToken;

use crate::orchestrator::frame::FrameIndex;
use crate::orchestrator::registry::{ResourceHandle, ResourceRegistry};

new_key_type! {
    /// Identifies one tracked async job.
    pub struct JobId;
}

/// A cooperatively-tracked async job.
pub struct AsyncJob {
    pub name: String,
    pub submit_frame: FrameIndex,
    /// Units of work remaining, for callers simulating a multi-tick job in
    /// tests; a real producer instead flips `ready` directly once its own
    /// work completes and leaves this at its initial value.
    pub remaining_work: usize,
    pub ready: Arc<AtomicBool>,
    /// The resource handle this job's output is destined for, and the
    /// generation it was computed against.
    pub resource_handle: Option<ResourceHandle>,
    pub generation: u64,
    pub cancellation_token: CancellationToken,
}

impl AsyncJob {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// The outcome of integrating one job during `AsyncPoll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationOutcome {
    Integrated,
    /// Discarded because the target resource's generation moved on since
    /// this job was submitted (spec §4.8's stale-generation rule).
    StaleGeneration,
}

/// Tracks every in-flight async job and performs bounded per-tick
/// integration.
#[derive(Default)]
pub struct AsyncPipelineTracker {
    jobs: SlotMap<JobId, AsyncJob>,
}

impl AsyncPipelineTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job and returns its id.
    pub fn submit(&mut self, job: AsyncJob) -> JobId {
        self.jobs.insert(job)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn cancel_all(&self) {
        for job in self.jobs.values() {
            job.cancellation_token.cancel();
        }
    }

    /// Integrates up to `budget` ready jobs, removing them from the
    /// tracker. Returns `(job_name, outcome)` pairs in the order processed.
    pub fn integrate_ready(
        &mut self,
        registry: &ResourceRegistry,
        budget: usize,
    ) -> Vec<(String, IntegrationOutcome)> {
        let ready_ids: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.is_ready())
            .take(budget)
            .map(|(id, _)| *id)
            .collect();

        let mut results = Vec::with_capacity(ready_ids.len());
        for id in ready_ids {
            let job = self.jobs.remove(id).expect("id came from this map");
            let outcome = match job.resource_handle {
                Some(handle) => match registry.generation(handle) {
                    Some(current) if current == job.generation => IntegrationOutcome::Integrated,
                    _ => IntegrationOutcome::StaleGeneration,
                },
                None => IntegrationOutcome::Integrated,
            };
            results.push((job.name, outcome));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_job(name: &str, resource_handle: Option<ResourceHandle>, generation: u64) -> AsyncJob {
        AsyncJob {
            name: name.to_string(),
            submit_frame: FrameIndex(0),
            remaining_work: 0,
            ready: Arc::new(AtomicBool::new(true)),
            resource_handle,
            generation,
            cancellation_token: CancellationToken::new(),
        }
    }

    #[test]
    fn not_ready_jobs_are_never_integrated() {
        let mut tracker = AsyncPipelineTracker::new();
        let mut job = ready_job("slow", None, 0);
        job.ready = Arc::new(AtomicBool::new(false));
        tracker.submit(job);

        let registry = ResourceRegistry::new();
        let results = tracker.integrate_ready(&registry, 10);
        assert!(results.is_empty());
        assert_eq!(tracker.pending_count(), 1);
    }

    #[test]
    fn stale_generation_jobs_are_discarded_not_integrated() {
        let registry = ResourceRegistry::new();
        let handle = registry.allocate("texture");
        registry.bump_generation(handle); // now generation 1

        let mut tracker = AsyncPipelineTracker::new();
        tracker.submit(ready_job("tex-upload", Some(handle), 0)); // stale: job computed for gen 0

        let results = tracker.integrate_ready(&registry, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, IntegrationOutcome::StaleGeneration);
    }

    #[test]
    fn integration_is_bounded_by_budget() {
        let registry = ResourceRegistry::new();
        let mut tracker = AsyncPipelineTracker::new();
        tracker.submit(ready_job("a", None, 0));
        tracker.submit(ready_job("b", None, 0));
        tracker.submit(ready_job("c", None, 0));

        let results = tracker.integrate_ready(&registry, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(tracker.pending_count(), 1);
    }
}
