//! `FrameContext`: the central per-frame coordination object.
//!
//! Exposes three access layers with distinct mutation rules (spec §3/§4.4):
//!
//! - **Immutable layer** (`config`): set at construction, read-only after.
//! - **Engine-state layer**: graphics/thread-pool handles, fence/epoch
//!   markers, surfaces, frame timing. Mutation requires an
//!   [`EngineCapability`] token constructible only inside the orchestrator's
//!   trust boundary (`orchestrator.rs`).
//! - **Game-state layer**: mutable only during Category-A ordered phases;
//!   parallel phases see it exclusively through a published
//!   [`FrameSnapshot`](crate::orchestrator::snapshot::FrameSnapshot).
//!
//! Misuse never panics outside debug builds: capability-gated mutation
//! without a token is a release-mode no-op with a warning, a debug-mode
//! assertion (spec §7); phase-gated accessors just return `None`.

use rustc_hash::FxHashMap;

use crate::config::OrchestratorConfig;
use crate::orchestrator::frame::{Epoch, FrameIndex};
use crate::orchestrator::graphics::Surface;
use crate::orchestrator::parallel::ParallelTaskOutput;
use crate::orchestrator::phase::Phase;
use crate::orchestrator::snapshot::FrameSnapshot;

/// A capability token constructible only inside the orchestrator's trust
/// boundary. Holding one is proof that the caller is engine-internal code.
///
/// Deliberately not `Clone`/`Copy`-derived beyond what's needed: the
/// orchestrator mints exactly one per frame phase transition and threads
/// `&EngineCapability` through, rather than handing out owned copies.
#[derive(Debug)]
pub struct EngineCapability(());

impl EngineCapability {
    /// Only [`Orchestrator`](crate::orchestrator::Orchestrator) calls this.
    pub(crate) fn mint() -> Self {
        EngineCapability(())
    }
}

/// Opaque placeholder for the render-graph builder handed out during the
/// `FrameGraph` phase. Concrete render-graph topology is outside this
/// crate's scope (spec §1 Non-goals); this type exists only so
/// `render_graph_builder()` has something non-null to return.
#[derive(Debug, Default)]
pub struct RenderGraphBuilder {
    pub(crate) presentable: Vec<String>,
}

impl RenderGraphBuilder {
    /// Marks a surface (by name) as part of this frame's presentable set.
    pub fn mark_presentable(&mut self, surface_name: &str) {
        self.presentable.push(surface_name.to_string());
    }
}

/// The game-state layer. Kept deliberately minimal — concrete entity /
/// transform / animation representations are an engine concern outside
/// this crate's scope. A flat counter map is enough to exercise the
/// mutation-and-snapshot contract the spec actually specifies.
#[derive(Debug, Default, Clone)]
pub struct GameState {
    pub counters: FxHashMap<String, i64>,
}

impl GameState {
    pub fn set(&mut self, key: &str, value: i64) {
        self.counters.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.counters.get(key).copied()
    }
}

/// The per-frame coordination object passed to every module hook.
pub struct FrameContext {
    // --- immutable layer ---
    config: std::sync::Arc<OrchestratorConfig>,

    // --- engine-state layer (capability-gated) ---
    phase: Phase,
    frame_index: FrameIndex,
    epoch: Epoch,
    completed_frame: FrameIndex,
    surfaces: Vec<Surface>,
    frame_start: Option<std::time::Instant>,
    render_graph_builder: Option<RenderGraphBuilder>,
    snapshot: Option<FrameSnapshot>,
    /// Per-task outputs from the just-finished `ParallelWork` barrier,
    /// populated for `PostParallel` to integrate (spec §4.5/§4.2 phase 11).
    parallel_results: Vec<ParallelTaskOutput>,

    // --- game-state layer (phase-gated) ---
    game_state: GameState,
}

impl FrameContext {
    #[must_use]
    pub fn new(config: std::sync::Arc<OrchestratorConfig>, surfaces: Vec<Surface>) -> Self {
        Self {
            config,
            phase: Phase::FrameStart,
            frame_index: FrameIndex::default(),
            epoch: Epoch::default(),
            completed_frame: FrameIndex::default(),
            surfaces,
            frame_start: None,
            render_graph_builder: None,
            snapshot: None,
            parallel_results: Vec::new(),
            game_state: GameState::default(),
        }
    }

    // ------------------------------------------------------------------
    // Immutable layer
    // ------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Engine-state layer: read access is always allowed
    // ------------------------------------------------------------------

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn frame_index(&self) -> FrameIndex {
        self.frame_index
    }

    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub fn completed_frame(&self) -> FrameIndex {
        self.completed_frame
    }

    #[must_use]
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    #[must_use]
    pub fn surfaces_mut_unchecked(&mut self) -> &mut [Surface] {
        // Surface cost-estimate bookkeeping is not capability-gated in the
        // spec (only the phase marker / frame index / fence / snapshot
        // publication are listed as capability-gated mutators); modules
        // flip `commands_recorded`/`commands_submitted` directly.
        &mut self.surfaces
    }

    #[must_use]
    pub fn elapsed_since_frame_start(&self) -> Option<std::time::Duration> {
        self.frame_start.map(|start| start.elapsed())
    }

    // ------------------------------------------------------------------
    // Engine-state layer: capability-gated mutation
    // ------------------------------------------------------------------

    pub(crate) fn set_phase(&mut self, phase: Phase, _cap: &EngineCapability) {
        self.phase = phase;
    }

    pub(crate) fn advance_frame_index(&mut self, _cap: &EngineCapability) {
        self.frame_index = self.frame_index.next();
    }

    pub(crate) fn advance_epoch(&mut self, _cap: &EngineCapability) {
        self.epoch = self.epoch.next();
    }

    pub(crate) fn set_completed_frame(&mut self, completed: FrameIndex, _cap: &EngineCapability) {
        self.completed_frame = completed;
    }

    pub(crate) fn mark_frame_start(&mut self, _cap: &EngineCapability) {
        self.frame_start = Some(std::time::Instant::now());
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: FrameSnapshot, _cap: &EngineCapability) {
        self.snapshot = Some(snapshot);
    }

    pub(crate) fn clear_snapshot(&mut self, _cap: &EngineCapability) {
        self.snapshot = None;
    }

    pub(crate) fn set_parallel_results(&mut self, results: Vec<ParallelTaskOutput>, _cap: &EngineCapability) {
        self.parallel_results = results;
    }

    pub(crate) fn clear_parallel_results(&mut self, _cap: &EngineCapability) {
        self.parallel_results.clear();
    }

    pub(crate) fn open_render_graph_builder(&mut self, _cap: &EngineCapability) {
        self.render_graph_builder = Some(RenderGraphBuilder::default());
    }

    pub(crate) fn take_render_graph_builder(
        &mut self,
        _cap: &EngineCapability,
    ) -> Option<RenderGraphBuilder> {
        self.render_graph_builder.take()
    }

    /// Dynamic-token variant of [`Self::set_phase`], demonstrating the
    /// spec's runtime misuse contract (§7): a `None` token is a
    /// release-mode no-op with a warning diagnostic, a debug-mode
    /// assertion failure. Engine-internal code always holds a real token
    /// and uses [`Self::set_phase`] directly; this entry point exists for
    /// embedding code that only conditionally possesses one.
    pub fn set_phase_checked(&mut self, phase: Phase, cap: Option<&EngineCapability>) -> bool {
        match cap {
            Some(token) => {
                self.set_phase(phase, token);
                true
            }
            None => {
                if cfg!(debug_assertions) {
                    panic!("capability misuse: set_phase attempted without an EngineCapability token");
                }
                log::warn!(
                    target: "myth_orchestrator",
                    "capability misuse: set_phase attempted without a token (no-op)"
                );
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase-gated views
    // ------------------------------------------------------------------

    /// `true` iff the current phase allows direct game-state mutation
    /// (Category A ordered phases).
    #[must_use]
    pub fn can_mutate_game_state(&self) -> bool {
        self.phase.is_game_state_mutable()
    }

    /// Mutable game-state access, gated by phase. Returns `None` (with a
    /// warning diagnostic) outside Category A phases rather than panicking.
    pub fn game_state_mut(&mut self) -> Option<&mut GameState> {
        if self.can_mutate_game_state() {
            Some(&mut self.game_state)
        } else {
            log::warn!(
                target: "myth_orchestrator",
                "game_state_mut() denied in phase {:?} (not a Category A phase)",
                self.phase
            );
            None
        }
    }

    #[must_use]
    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// The published snapshot, valid from `ParallelWork` through the end of
    /// `PostParallel` of the same frame (spec §4.4).
    #[must_use]
    pub fn snapshot_view(&self) -> Option<&FrameSnapshot> {
        match self.phase {
            Phase::ParallelWork | Phase::PostParallel => self.snapshot.as_ref(),
            _ => None,
        }
    }

    /// Every per-task output produced by the just-finished `ParallelWork`
    /// barrier, valid only during `PostParallel` — the phase the spec names
    /// as the one that integrates them.
    #[must_use]
    pub fn parallel_results(&self) -> Option<&[ParallelTaskOutput]> {
        match self.phase {
            Phase::PostParallel => Some(&self.parallel_results),
            _ => None,
        }
    }

    /// The render-graph builder, valid only during `FrameGraph`.
    #[must_use]
    pub fn render_graph_builder(&mut self) -> Option<&mut RenderGraphBuilder> {
        if self.phase == Phase::FrameGraph {
            self.render_graph_builder.as_mut()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FrameContext {
        FrameContext::new(std::sync::Arc::new(OrchestratorConfig::default()), vec![])
    }

    #[test]
    fn can_mutate_game_state_only_in_category_a_phases() {
        let mut context = ctx();
        let cap = EngineCapability::mint();
        context.set_phase(Phase::Gameplay, &cap);
        assert!(context.can_mutate_game_state());
        context.set_phase(Phase::ParallelWork, &cap);
        assert!(!context.can_mutate_game_state());
    }

    #[test]
    fn snapshot_view_only_visible_during_parallel_and_post_parallel() {
        let mut context = ctx();
        let cap = EngineCapability::mint();
        context.set_phase(Phase::Snapshot, &cap);
        assert!(context.snapshot_view().is_none());
        context.set_phase(Phase::ParallelWork, &cap);
        // still None: nothing published yet in this unit test
        assert!(context.snapshot_view().is_none());
    }

    #[test]
    fn render_graph_builder_only_non_null_during_frame_graph() {
        let mut context = ctx();
        let cap = EngineCapability::mint();
        context.set_phase(Phase::Gameplay, &cap);
        assert!(context.render_graph_builder().is_none());
        context.set_phase(Phase::FrameGraph, &cap);
        context.open_render_graph_builder(&cap);
        assert!(context.render_graph_builder().is_some());
    }

    #[test]
    #[should_panic(expected = "capability misuse")]
    fn set_phase_checked_without_token_panics_in_debug() {
        let mut context = ctx();
        context.set_phase_checked(Phase::Gameplay, None);
    }

    #[test]
    fn game_state_mut_denied_outside_category_a() {
        let mut context = ctx();
        let cap = EngineCapability::mint();
        context.set_phase(Phase::ParallelWork, &cap);
        assert!(context.game_state_mut().is_none());
    }
}
