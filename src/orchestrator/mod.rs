//! The frame orchestrator: owns every per-frame subsystem and drives the
//! seventeen-phase pipeline to completion, frame after frame, until asked
//! to stop.
//!
//! Mirrors the teacher's top-level `app::App` in spirit (one struct owning
//! the render loop's moving parts — asset server, scene, renderer) but
//! expressed as a scheduler rather than a windowed application: there is no
//! `winit` event loop here, only [`Orchestrator::run`] driving phases.

pub mod async_tracker;
pub mod clock;
pub mod descriptor;
pub mod diagnostics;
pub mod frame;
pub mod frame_context;
pub mod graphics;
pub mod module;
pub mod module_manager;
pub mod parallel;
pub mod phase;
pub mod reclaim;
pub mod registry;
pub mod snapshot;
pub mod thread_pool;

pub use async_tracker::{AsyncJob, AsyncPipelineTracker, IntegrationOutcome, JobId};
pub use clock::{BudgetHint, ClockAndBudget};
pub use descriptor::{DescriptorSlot, DescriptorTable};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, LogSink, Severity};
pub use frame::{Epoch, FrameIndex};
pub use frame_context::{EngineCapability, FrameContext, GameState, RenderGraphBuilder};
pub use graphics::{GraphicsFacade, SimulatedGraphicsFacade, Surface};
pub use module::{HookTable, ModuleRecord, ParallelHook, OrderedHook, PhaseSet, Priority};
pub use module_manager::ModuleManager;
pub use parallel::{ParallelTaskGroup, ParallelTaskOutput};
pub use phase::{Phase, PhaseKind, PHASE_ORDER};
pub use reclaim::{DeferredReclaimer, ReclaimEntry};
pub use registry::{ResourceHandle, ResourceRegistry};
pub use snapshot::{FrameSnapshot, GameStateSnapshot, SnapshotPublisher, SubsystemSpan};
pub use thread_pool::ThreadPool;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::OrchestratorConfig;
use crate::error::Result;

/// Owns every per-frame subsystem and drives the pipeline.
///
/// Construction takes a [`GraphicsFacade`] and [`DiagnosticSink`] by trait
/// object, per spec §9's "global singletons become explicit dependencies":
/// nothing here reaches for a process-global runtime or registry.
pub struct Orchestrator {
    config: Arc<OrchestratorConfig>,
    thread_pool: thread_pool::ThreadPool,
    graphics: Arc<dyn GraphicsFacade>,
    modules: ModuleManager,
    clock: ClockAndBudget,
    snapshot_publisher: SnapshotPublisher,
    async_tracker: AsyncPipelineTracker,
    parallel_group: ParallelTaskGroup,
    diagnostics: Box<dyn DiagnosticSink>,
    context: FrameContext,
    cancellation: CancellationToken,
    completed_tx: watch::Sender<FrameIndex>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        graphics: Arc<dyn GraphicsFacade>,
        thread_pool: thread_pool::ThreadPool,
        diagnostics: Box<dyn DiagnosticSink>,
        surfaces: Vec<Surface>,
    ) -> Self {
        let config = Arc::new(config);
        let (completed_tx, _) = watch::channel(FrameIndex::default());
        let clock = ClockAndBudget::new(config.target_interval(), config.budget_ema_samples);
        Self {
            context: FrameContext::new(Arc::clone(&config), surfaces),
            config,
            thread_pool,
            graphics,
            modules: ModuleManager::new(),
            clock,
            snapshot_publisher: SnapshotPublisher::new(),
            async_tracker: AsyncPipelineTracker::new(),
            parallel_group: ParallelTaskGroup::new(),
            diagnostics,
            cancellation: CancellationToken::new(),
            completed_tx,
        }
    }

    /// Registers a module (spec §6). Rejects a duplicate name.
    pub fn register_module(&mut self, module: ModuleRecord) -> Result<()> {
        self.modules.register(module)
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// A receiver observing the most recently fully-reclaimed frame index,
    /// updated at the end of every `FrameEnd` (spec §6's `completed()`).
    /// `tokio::sync::watch` rather than a one-shot channel because any
    /// number of awaiters may subscribe after frames have already run.
    #[must_use]
    pub fn completed(&self) -> watch::Receiver<FrameIndex> {
        self.completed_tx.subscribe()
    }

    /// Requests the run loop stop after the current frame. Idempotent:
    /// `CancellationToken::cancel` is a no-op if already cancelled.
    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    /// Runs every registered module's `initialize` hook (spec §4.3).
    pub async fn initialize(&mut self) -> Result<()> {
        let cap = EngineCapability::mint();
        self.modules.initialize_all(&mut self.context, &cap).await
    }

    /// Runs every registered module's `shutdown` hook in reverse priority
    /// order. Failures are diagnostics, not propagated, so every module
    /// gets a chance to shut down regardless of earlier failures.
    pub async fn shutdown(&mut self) {
        self.modules
            .shutdown_all(&mut self.context, self.diagnostics.as_ref())
            .await;
    }

    /// Drives the pipeline for `frame_count` frames, or indefinitely if
    /// `None`, stopping early if [`Orchestrator::stop`] is called.
    pub async fn run(&mut self, frame_count: Option<u64>) -> Result<()> {
        let mut remaining = frame_count;
        loop {
            if self.cancellation.is_cancelled() {
                break;
            }
            if let Some(0) = remaining {
                break;
            }
            self.run_frame().await?;
            remaining = remaining.map(|n| n - 1);

            if let Some(sleep_for) = self.clock.pacing_sleep() {
                tokio::time::sleep(sleep_for).await;
            }
        }
        Ok(())
    }

    async fn run_frame(&mut self) -> Result<()> {
        let cap = EngineCapability::mint();

        // --- FrameStart ---
        // `frame_index`/`epoch` are advanced at the end of this method, not
        // here: the value read for the remainder of this function must be
        // this frame's own identity (starting at 0 for the very first
        // frame), not the next frame's.
        self.context.set_phase(Phase::FrameStart, &cap);
        self.context.mark_frame_start(&cap);
        self.clock.begin_frame();
        self.graphics.begin_frame(self.context.frame_index());

        // --- Ordered Category-A phases ---
        for phase in [
            Phase::Input,
            Phase::NetworkReconciliation,
            Phase::RandomSeedManagement,
            Phase::FixedSimulation,
            Phase::Gameplay,
            Phase::SceneMutation,
            Phase::TransformPropagation,
        ] {
            self.context.set_phase(phase, &cap);
            self.modules
                .dispatch_ordered(phase, &mut self.context, self.diagnostics.as_ref())
                .await;
        }

        // --- AsyncWork dispatch ---
        // Not one of the seventeen canonical phases (spec §4.2); a
        // ModuleManager dispatch discipline in its own right (spec §4.3).
        // Hooks only yield registrations — the tracker submission itself
        // happens here, in the orchestrator's own trust boundary.
        let submitted_jobs = self
            .modules
            .dispatch_async_work(&mut self.context, self.diagnostics.as_ref())
            .await;
        for job in submitted_jobs {
            self.async_tracker.submit(job);
        }

        // --- Snapshot ---
        self.context.set_phase(Phase::Snapshot, &cap);
        let snapshot = self.snapshot_publisher.publish(GameStateSnapshot {
            frame_index: self.context.frame_index(),
            epoch: self.context.epoch(),
            data: Vec::new(),
            spans: FxHashMap::default(),
            counters: self.context.game_state().counters.clone(),
        });
        self.context.set_snapshot(snapshot.clone(), &cap);

        // --- ParallelWork ---
        self.context.set_phase(Phase::ParallelWork, &cap);
        let parallel_results = self
            .parallel_group
            .run(self.modules.parallel_work_modules(), &snapshot, self.diagnostics.as_ref())
            .await?;

        // --- PostParallel ---
        // Per-task outputs from the barrier just completed are published
        // into the context so ordered hooks here can integrate them (spec
        // §4.5, §4.2 phase 11).
        self.context.set_phase(Phase::PostParallel, &cap);
        self.context.set_parallel_results(parallel_results, &cap);
        self.modules
            .dispatch_ordered(Phase::PostParallel, &mut self.context, self.diagnostics.as_ref())
            .await;
        self.context.clear_snapshot(&cap);
        self.context.clear_parallel_results(&cap);

        // --- FrameGraph ---
        self.context.set_phase(Phase::FrameGraph, &cap);
        self.context.open_render_graph_builder(&cap);
        self.modules
            .dispatch_ordered(Phase::FrameGraph, &mut self.context, self.diagnostics.as_ref())
            .await;
        let presentable = self
            .context
            .take_render_graph_builder(&cap)
            .map(|builder| builder.presentable)
            .unwrap_or_default();

        // --- CommandRecord ---
        // One `ThreadPool`-scheduled task per presentable surface, joined
        // via the same `JoinSet` style as `ParallelWork` (spec §4.7).
        self.context.set_phase(Phase::CommandRecord, &cap);
        let mut command_record_tasks = tokio::task::JoinSet::new();
        for surface in self.context.surfaces() {
            if !presentable.iter().any(|name| name == &surface.name) {
                continue;
            }
            let graphics = Arc::clone(&self.graphics);
            let name = surface.name.clone();
            command_record_tasks.spawn_on(
                async move {
                    let ok = graphics.record_surface(&name);
                    (name, ok)
                },
                self.thread_pool.handle(),
            );
        }
        let mut recorded = std::collections::HashSet::new();
        while let Some(joined) = command_record_tasks.join_next().await {
            let (name, ok) = joined.map_err(crate::error::OrchestratorError::from)?;
            if ok {
                recorded.insert(name);
            }
        }
        for surface in self.context.surfaces_mut_unchecked() {
            surface.commands_recorded = recorded.contains(&surface.name);
        }

        // --- Present ---
        self.context.set_phase(Phase::Present, &cap);
        self.graphics.present_surfaces(self.context.surfaces_mut_unchecked());

        // --- AsyncPoll ---
        self.context.set_phase(Phase::AsyncPoll, &cap);
        let integrated = self
            .async_tracker
            .integrate_ready(self.graphics.resource_registry(), self.config.async_budget_per_tick);
        for (name, outcome) in integrated {
            if outcome == IntegrationOutcome::StaleGeneration {
                self.diagnostics.record(Diagnostic::new(
                    Severity::Warning,
                    "async-job-stale-generation",
                    format!("discarded async job '{name}': resource generation moved on"),
                ));
            }
        }

        // --- BudgetAdapt ---
        self.context.set_phase(Phase::BudgetAdapt, &cap);
        let hint = self.clock.end_frame();
        if hint == BudgetHint::Degrade {
            self.diagnostics.record(Diagnostic::new(
                Severity::Info,
                "budget-degrade",
                "frame budget over target; shedding optional async work next tick",
            ));
        }

        // --- FrameEnd ---
        self.context.set_phase(Phase::FrameEnd, &cap);
        // `completed_frame()` is `None` for the first `safety_delay` frames
        // of a run, since no frame has actually retired yet; reclamation
        // and the `completed()` watch channel both stay untouched until
        // then (spec invariant 4: never retire earlier than `submitted_frame
        // + safety_delay`).
        if let Some(completed) = self.graphics.completed_frame() {
            self.context.set_completed_frame(completed, &cap);
            for entry in self.graphics.deferred_reclaimer().process_completed_frame(completed) {
                self.graphics.resource_registry().remove(entry.resource_handle);
            }
            let _ = self.completed_tx.send(completed);
        }
        if self.graphics.deferred_reclaimer().is_over_soft_threshold() {
            self.diagnostics.record(Diagnostic::new(
                Severity::Warning,
                "reclaim-backlog",
                "deferred reclaim queue exceeds its soft threshold",
            ));
        }

        // Advance to the next frame's identity now that this one is fully
        // retired; every read of `frame_index()`/`epoch()` above observed
        // this frame's own value (spec invariant 1).
        self.context.advance_frame_index(&cap);
        self.context.advance_epoch(&cap);

        Ok(())
    }
}
