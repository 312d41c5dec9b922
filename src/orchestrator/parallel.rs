//! `ParallelTaskGroup`: fan-out/join barrier for `ParallelWork` (spec §4.5).
//!
//! Built on `tokio::task::JoinSet` rather than `futures::future::join_all`:
//! a `JoinSet` lets the group abort every still-running task the moment one
//! panics or the group is stopped early, which `join_all` cannot do without
//! extra bookkeeping. Each task also carries a child
//! `tokio_util::sync::CancellationToken` so a module's work can observe
//! cancellation cooperatively instead of being aborted mid-write.

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{OrchestratorError, Result};
use crate::orchestrator::diagnostics::{Diagnostic, DiagnosticSink};
use crate::orchestrator::module::ParallelHook;
use crate::orchestrator::phase::Phase;
use crate::orchestrator::snapshot::FrameSnapshot;

/// Per-task output: the module name that produced it and its raw bytes.
pub struct ParallelTaskOutput {
    pub module_name: String,
    pub bytes: Vec<u8>,
}

/// Owns the cancellation token for one `ParallelWork` barrier and drives the
/// fan-out/join of every registered parallel hook.
pub struct ParallelTaskGroup {
    cancellation: CancellationToken,
}

impl Default for ParallelTaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelTaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
        }
    }

    /// Requests cooperative cancellation of every still-running task in the
    /// current barrier (spec §4.5, `stop()` propagation).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Fans out every `(name, hook)` pair against `snapshot`, joins all of
    /// them, and returns the per-module outputs in completion order. A
    /// module whose hook panics or errors is recorded as a diagnostic and
    /// excluded from the returned outputs — it never blocks or poisons the
    /// rest of the barrier (spec invariant 4: parallel work never mutates
    /// shared game state, so one task's failure cannot corrupt another's).
    pub async fn run<'a>(
        &self,
        hooks: impl Iterator<Item = (&'a str, &'a ParallelHook)>,
        snapshot: &FrameSnapshot,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<ParallelTaskOutput>> {
        let mut joins: JoinSet<(String, Result<Vec<u8>>)> = JoinSet::new();

        for (name, hook) in hooks {
            let future = hook(snapshot.clone());
            let owned_name = name.to_string();
            let token = self.cancellation.clone();
            joins.spawn(async move {
                tokio::select! {
                    biased;
                    () = token.cancelled() => (owned_name, Err(OrchestratorError::TaskJoinError("cancelled".into()))),
                    result = future => (owned_name, result),
                }
            });
        }

        let mut outputs = Vec::new();
        while let Some(joined) = joins.join_next().await {
            let (module_name, result) = joined?;
            match result {
                Ok(bytes) => outputs.push(ParallelTaskOutput { module_name, bytes }),
                Err(err) => sink.record(Diagnostic::module_failure(Phase::ParallelWork, &module_name, err.to_string())),
            }
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::frame::{Epoch, FrameIndex};
    use crate::orchestrator::snapshot::{GameStateSnapshot, SnapshotPublisher};
    use rustc_hash::FxHashMap;

    fn snapshot() -> FrameSnapshot {
        let publisher = SnapshotPublisher::default();
        publisher.publish(GameStateSnapshot {
            frame_index: FrameIndex(0),
            epoch: Epoch(0),
            data: vec![],
            spans: FxHashMap::default(),
            counters: FxHashMap::default(),
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn all_tasks_complete_and_produce_outputs() {
        let group = ParallelTaskGroup::new();
        let snap = snapshot();
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();

        let a: ParallelHook = Box::new(|_s| Box::pin(async { Ok(vec![1, 2, 3]) }));
        let b: ParallelHook = Box::new(|_s| Box::pin(async { Ok(vec![4, 5]) }));
        let hooks: Vec<(&str, &ParallelHook)> = vec![("a", &a), ("b", &b)];

        let outputs = group.run(hooks.into_iter(), &snap, &sink).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(sink.snapshot().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_failing_task_is_isolated_as_a_diagnostic() {
        let group = ParallelTaskGroup::new();
        let snap = snapshot();
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();

        let failing: ParallelHook =
            Box::new(|_s| Box::pin(async { Err(OrchestratorError::TaskJoinError("boom".into())) }));
        let hooks: Vec<(&str, &ParallelHook)> = vec![("bad", &failing)];

        let outputs = group.run(hooks.into_iter(), &snap, &sink).await.unwrap();
        assert!(outputs.is_empty());
        assert_eq!(sink.snapshot().len(), 1);
    }
}
