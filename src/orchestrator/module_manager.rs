//! `ModuleManager`: registration, ordering, and ordered-phase dispatch.
//!
//! Grounded in the teacher's flat `passes/mod.rs` enumeration of concrete
//! render passes run in a fixed sequence; this crate generalizes that fixed
//! sequence into a runtime-registered, priority-sorted `Vec<ModuleRecord>`
//! (spec §3, §4.3). Module hook failures never propagate past
//! [`ModuleManager::dispatch_ordered`] — they are recorded as diagnostics
//! and the remaining modules for that phase still run (spec §7's "never
//! propagates to siblings").

use crate::orchestrator::async_tracker::AsyncJob;
use crate::orchestrator::diagnostics::{Diagnostic, DiagnosticSink};
use crate::orchestrator::frame_context::{EngineCapability, FrameContext};
use crate::orchestrator::module::{ModuleRecord, Priority};
use crate::orchestrator::phase::Phase;
use crate::error::{OrchestratorError, Result};

/// Holds every registered module, sorted by `(priority, insertion_index)`
/// so that ties break on registration order (spec §3).
#[derive(Default)]
pub struct ModuleManager {
    modules: Vec<ModuleRecord>,
}

impl ModuleManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module. Rejects a duplicate name (spec §7); the
    /// underlying `Vec` is re-sorted by `(priority, insertion order)` after
    /// every successful insertion — modules always iterate in priority
    /// order with no per-dispatch sort cost.
    pub fn register(&mut self, module: ModuleRecord) -> Result<()> {
        if self.modules.iter().any(|m| m.name == module.name) {
            return Err(OrchestratorError::DuplicateModule(module.name));
        }
        self.modules.push(module);
        self.modules.sort_by_key(|m| m.priority);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[must_use]
    pub fn names_in_priority_order(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Runs every module's `initialize` hook in priority order, aborting on
    /// the first failure (lifecycle hooks, unlike per-frame ordered hooks,
    /// are allowed to fail the whole startup — spec §4.3's round-trip law:
    /// initialize/shutdown pairing only holds if initialize fully succeeds).
    pub async fn initialize_all(&mut self, context: &mut FrameContext, cap: &EngineCapability) -> Result<()> {
        for module in &mut self.modules {
            if let Some(hook) = module.hooks.initialize.as_mut() {
                hook(context).await.map_err(|e| {
                    OrchestratorError::FatalInvariantViolation(format!(
                        "module '{}' failed to initialize: {e}",
                        module.name
                    ))
                })?;
            }
        }
        let _ = cap;
        Ok(())
    }

    /// Runs every module's `shutdown` hook in reverse priority order.
    /// Failures are logged as diagnostics, not propagated — shutdown must
    /// run to completion for every module regardless of earlier failures.
    pub async fn shutdown_all(
        &mut self,
        context: &mut FrameContext,
        sink: &dyn DiagnosticSink,
    ) {
        for module in self.modules.iter_mut().rev() {
            if let Some(hook) = module.hooks.shutdown.as_mut() {
                if let Err(err) = hook(context).await {
                    sink.record(Diagnostic::module_failure(
                        Phase::FrameEnd,
                        &module.name,
                        err.to_string(),
                    ));
                }
            }
        }
    }

    /// Runs every module's hook for `phase`, in priority order, isolating
    /// failures as diagnostics (spec §8 Scenario C). A module that does not
    /// declare `phase` in its `PhaseSet`, or declares it but has no hook
    /// attached, is skipped with no cost.
    pub async fn dispatch_ordered(
        &mut self,
        phase: Phase,
        context: &mut FrameContext,
        sink: &dyn DiagnosticSink,
    ) {
        for module in &mut self.modules {
            let Some(hook) = module.ordered_hook_mut(phase) else {
                continue;
            };
            if let Err(err) = hook(context).await {
                sink.record(Diagnostic::module_failure(phase, &module.name, err.to_string()));
            }
        }
    }

    /// Runs every module's async-dispatch hook (Category D, spec §4.3),
    /// collecting the [`AsyncJob`] registrations they yield. The manager
    /// only gathers the registrations here — the caller is responsible for
    /// submitting them into the `AsyncPipelineTracker`, which this manager
    /// has no handle to. A failing hook is isolated as a diagnostic, same
    /// as `dispatch_ordered`.
    pub async fn dispatch_async_work(
        &mut self,
        context: &mut FrameContext,
        sink: &dyn DiagnosticSink,
    ) -> Vec<AsyncJob> {
        let mut jobs = Vec::new();
        for module in &mut self.modules {
            let Some(hook) = module.async_work_hook_mut() else {
                continue;
            };
            match hook(context).await {
                Ok(mut submitted) => jobs.append(&mut submitted),
                Err(err) => sink.record(Diagnostic::module_failure(Phase::AsyncPoll, &module.name, err.to_string())),
            }
        }
        jobs
    }

    /// Modules declaring `Phase::ParallelWork` with a `parallel_work` hook
    /// attached, in priority order. Returned by reference so the caller
    /// (`ParallelTaskGroup`) can fan them out without cloning hook closures.
    pub fn parallel_work_modules(&self) -> impl Iterator<Item = (&str, &crate::orchestrator::module::ParallelHook)> {
        self.modules
            .iter()
            .filter(|m| m.supports(Phase::ParallelWork))
            .filter_map(|m| m.hooks.parallel_work.as_ref().map(|hook| (m.name.as_str(), hook)))
    }

    #[must_use]
    pub fn priority_of(&self, name: &str) -> Option<Priority> {
        self.modules.iter().find(|m| m.name == name).map(|m| m.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::module::PhaseSet;

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut manager = ModuleManager::new();
        manager
            .register(ModuleRecord::new("a", Priority::NORMAL, PhaseSet::empty()))
            .unwrap();
        let err = manager
            .register(ModuleRecord::new("a", Priority::NORMAL, PhaseSet::empty()))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateModule(name) if name == "a"));
    }

    #[test]
    fn modules_iterate_in_priority_then_insertion_order() {
        let mut manager = ModuleManager::new();
        manager
            .register(ModuleRecord::new("low", Priority::LOW, PhaseSet::empty()))
            .unwrap();
        manager
            .register(ModuleRecord::new("critical", Priority::CRITICAL, PhaseSet::empty()))
            .unwrap();
        manager
            .register(ModuleRecord::new("normal_a", Priority::NORMAL, PhaseSet::empty()))
            .unwrap();
        manager
            .register(ModuleRecord::new("normal_b", Priority::NORMAL, PhaseSet::empty()))
            .unwrap();

        assert_eq!(
            manager.names_in_priority_order(),
            vec!["critical", "normal_a", "normal_b", "low"]
        );
    }

    #[tokio::test]
    async fn dispatch_ordered_skips_modules_not_declaring_the_phase() {
        let mut manager = ModuleManager::new();
        manager
            .register(ModuleRecord::new("idle", Priority::NORMAL, PhaseSet::empty()))
            .unwrap();
        let mut context = FrameContext::new(
            std::sync::Arc::new(crate::config::OrchestratorConfig::default()),
            vec![],
        );
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();
        manager.dispatch_ordered(Phase::Gameplay, &mut context, &sink).await;
        assert!(sink.snapshot().is_empty());
    }

    #[tokio::test]
    async fn a_failing_module_hook_does_not_block_the_next_module() {
        use crate::orchestrator::module::OrderedHook;

        let mut manager = ModuleManager::new();
        let failing: OrderedHook = Box::new(|_ctx| Box::pin(async { Err(OrchestratorError::TaskJoinError("boom".into())) }));
        let succeeding: OrderedHook = Box::new(|_ctx| Box::pin(async { Ok(()) }));

        manager
            .register(
                ModuleRecord::new("first", Priority::CRITICAL, PhaseSet::GAMEPLAY)
                    .on_gameplay(failing),
            )
            .unwrap();
        manager
            .register(
                ModuleRecord::new("second", Priority::NORMAL, PhaseSet::GAMEPLAY)
                    .on_gameplay(succeeding),
            )
            .unwrap();

        let mut context = FrameContext::new(
            std::sync::Arc::new(crate::config::OrchestratorConfig::default()),
            vec![],
        );
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();
        manager.dispatch_ordered(Phase::Gameplay, &mut context, &sink).await;

        let diagnostics = sink.snapshot();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].related_modules, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_async_work_collects_jobs_yielded_by_declaring_modules() {
        use crate::orchestrator::module::AsyncWorkHook;
        use std::sync::Arc;
        use std::sync::atomic::AtomicBool;
        use tokio_util::sync::CancellationToken;

        let mut manager = ModuleManager::new();

        let streaming_hook: AsyncWorkHook = Box::new(|_ctx| {
            Box::pin(async {
                Ok(vec![AsyncJob {
                    name: "stream-chunk".to_string(),
                    submit_frame: crate::orchestrator::frame::FrameIndex(0),
                    remaining_work: 1,
                    ready: Arc::new(AtomicBool::new(false)),
                    resource_handle: None,
                    generation: 0,
                    cancellation_token: CancellationToken::new(),
                }])
            })
        });
        manager
            .register(
                ModuleRecord::new("streamer", Priority::NORMAL, PhaseSet::ASYNC_WORK)
                    .on_async_work(streaming_hook),
            )
            .unwrap();
        manager
            .register(ModuleRecord::new("idle", Priority::NORMAL, PhaseSet::empty()))
            .unwrap();

        let mut context = FrameContext::new(
            std::sync::Arc::new(crate::config::OrchestratorConfig::default()),
            vec![],
        );
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();
        let jobs = manager.dispatch_async_work(&mut context, &sink).await;

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "stream-chunk");
        assert!(sink.snapshot().is_empty());
    }

    #[tokio::test]
    async fn dispatch_async_work_isolates_a_failing_hook_as_a_diagnostic() {
        use crate::orchestrator::module::AsyncWorkHook;

        let mut manager = ModuleManager::new();
        let failing: AsyncWorkHook =
            Box::new(|_ctx| Box::pin(async { Err(OrchestratorError::TaskJoinError("boom".into())) }));
        manager
            .register(
                ModuleRecord::new("broken", Priority::NORMAL, PhaseSet::ASYNC_WORK)
                    .on_async_work(failing),
            )
            .unwrap();

        let mut context = FrameContext::new(
            std::sync::Arc::new(crate::config::OrchestratorConfig::default()),
            vec![],
        );
        let sink = crate::orchestrator::diagnostics::CollectingSink::default();
        let jobs = manager.dispatch_async_work(&mut context, &sink).await;

        assert!(jobs.is_empty());
        assert_eq!(sink.snapshot().len(), 1);
    }
}
