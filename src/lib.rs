//! An async frame orchestrator: the scheduler at the center of a real-time
//! engine's main loop. Owns the seventeen-phase pipeline, module
//! registration and dispatch, the snapshot hand-off from ordered game-state
//! mutation to parallel read-only work, deferred GPU resource reclamation,
//! and bounded per-tick integration of long-running async jobs.
//!
//! Concrete rendering, asset decoding, and scene representation are out of
//! scope — see [`orchestrator::graphics::GraphicsFacade`] for the seam a
//! real backend plugs into.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};
pub use orchestrator::{
    AsyncJob, AsyncPipelineTracker, BudgetHint, ClockAndBudget, CollectingSink, Diagnostic,
    DiagnosticSink, EngineCapability, Epoch, FrameContext, FrameIndex, FrameSnapshot, GameState,
    GameStateSnapshot, GraphicsFacade, HookTable, LogSink, ModuleManager, ModuleRecord,
    Orchestrator, ParallelTaskGroup, Phase, PhaseKind, PhaseSet, Priority, ResourceHandle,
    ResourceRegistry, Severity, SimulatedGraphicsFacade, SnapshotPublisher, Surface, ThreadPool,
};
