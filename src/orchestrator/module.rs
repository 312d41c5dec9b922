//! Module declarations: the capability-set participant contract.
//!
//! The source this design is drawn from uses a virtual `Module` base class
//! with one no-op hook per phase. This crate expresses a participant as a
//! data contract instead: a [`PhaseSet`] bitset declares which phases it
//! takes part in, and a [`HookTable`] holds only the hooks it actually uses.
//! Unused hooks require no code, and the dispatcher tests the bitset before
//! ever calling into the hook table (spec §9).

use std::future::Future;
use std::pin::Pin;

use bitflags::bitflags;

use crate::error::Result;
use crate::orchestrator::async_tracker::AsyncJob;
use crate::orchestrator::frame_context::FrameContext;
use crate::orchestrator::phase::Phase;

/// A boxed, `Send` future — the crate's stand-in for the spec's
/// "cooperative task that may suspend" (spec §9).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

bitflags! {
    /// Bitset over the phase enumeration. A module is scheduled for a phase
    /// iff the phase's bit is set (spec invariant 3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhaseSet: u32 {
        const INPUT                   = 1 << 1;
        const NETWORK_RECONCILIATION  = 1 << 2;
        const RANDOM_SEED_MANAGEMENT  = 1 << 3;
        const FIXED_SIMULATION        = 1 << 4;
        const GAMEPLAY                = 1 << 5;
        const SCENE_MUTATION          = 1 << 6;
        const TRANSFORM_PROPAGATION   = 1 << 7;
        const PARALLEL_WORK           = 1 << 9;
        const POST_PARALLEL           = 1 << 10;
        const FRAME_GRAPH             = 1 << 11;
        const ASYNC_WORK              = 1 << 14;
    }
}

impl PhaseSet {
    /// Maps a [`Phase`] to its corresponding bit, if that phase supports
    /// module participation at all (`FrameStart`, `Present`, `BudgetAdapt`,
    /// etc. are orchestrator-internal and have no bit).
    #[must_use]
    pub fn bit_for(phase: Phase) -> Option<PhaseSet> {
        match phase {
            Phase::Input => Some(PhaseSet::INPUT),
            Phase::NetworkReconciliation => Some(PhaseSet::NETWORK_RECONCILIATION),
            Phase::RandomSeedManagement => Some(PhaseSet::RANDOM_SEED_MANAGEMENT),
            Phase::FixedSimulation => Some(PhaseSet::FIXED_SIMULATION),
            Phase::Gameplay => Some(PhaseSet::GAMEPLAY),
            Phase::SceneMutation => Some(PhaseSet::SCENE_MUTATION),
            Phase::TransformPropagation => Some(PhaseSet::TRANSFORM_PROPAGATION),
            Phase::ParallelWork => Some(PhaseSet::PARALLEL_WORK),
            Phase::PostParallel => Some(PhaseSet::POST_PARALLEL),
            Phase::FrameGraph => Some(PhaseSet::FRAME_GRAPH),
            _ => None,
        }
    }

    /// Whether a module declaring this set should be dispatched for `phase`.
    #[must_use]
    pub fn supports(self, phase: Phase) -> bool {
        Self::bit_for(phase).is_some_and(|bit| self.contains(bit))
    }
}

/// Registration priority. Lower values run earlier within a phase; ties
/// break on registration order (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(0);
    pub const HIGH: Priority = Priority(100);
    pub const NORMAL: Priority = Priority(500);
    pub const LOW: Priority = Priority(800);
    pub const BACKGROUND: Priority = Priority(900);
}

/// An ordered-phase hook: `FnMut(&mut FrameContext) -> BoxFuture<Result<()>>`.
pub type OrderedHook =
    Box<dyn for<'a> FnMut(&'a mut FrameContext) -> BoxFuture<'a, Result<()>> + Send>;

/// A parallel-phase hook: receives the read-only [`FrameSnapshot`](crate::orchestrator::snapshot::FrameSnapshot)
/// and returns task-private output bytes, never touching shared game state
/// (spec invariant 4).
pub type ParallelHook = Box<
    dyn Fn(
            crate::orchestrator::snapshot::FrameSnapshot,
        ) -> BoxFuture<'static, Result<Vec<u8>>>
        + Send
        + Sync,
>;

/// A lifecycle hook (`initialize`/`shutdown`).
pub type LifecycleHook =
    Box<dyn for<'a> FnMut(&'a mut FrameContext) -> BoxFuture<'a, Result<()>> + Send>;

/// An async-dispatch hook: yields the [`AsyncJob`] registrations a module
/// wants submitted this frame. The manager performs the actual
/// registration into the `AsyncPipelineTracker` — the hook only produces
/// the records (spec §4.3: "the manager only invokes the hook that yields
/// those registrations").
pub type AsyncWorkHook =
    Box<dyn for<'a> FnMut(&'a mut FrameContext) -> BoxFuture<'a, Result<Vec<AsyncJob>>> + Send>;

/// The small, fixed record of hooks a module supplies. Only the entries
/// matching its declared [`PhaseSet`] are ever invoked; everything else can
/// be left `None` at zero cost (spec §9's "no open-ended virtual
/// hierarchy").
#[derive(Default)]
pub struct HookTable {
    pub initialize: Option<LifecycleHook>,
    pub shutdown: Option<LifecycleHook>,
    pub input: Option<OrderedHook>,
    pub network_reconciliation: Option<OrderedHook>,
    pub random_seed_management: Option<OrderedHook>,
    pub fixed_simulation: Option<OrderedHook>,
    pub gameplay: Option<OrderedHook>,
    pub scene_mutation: Option<OrderedHook>,
    pub transform_propagation: Option<OrderedHook>,
    pub post_parallel: Option<OrderedHook>,
    pub frame_graph: Option<OrderedHook>,
    pub parallel_work: Option<ParallelHook>,
    pub async_work: Option<AsyncWorkHook>,
}

impl HookTable {
    fn ordered_hook_mut(&mut self, phase: Phase) -> Option<&mut OrderedHook> {
        match phase {
            Phase::Input => self.input.as_mut(),
            Phase::NetworkReconciliation => self.network_reconciliation.as_mut(),
            Phase::RandomSeedManagement => self.random_seed_management.as_mut(),
            Phase::FixedSimulation => self.fixed_simulation.as_mut(),
            Phase::Gameplay => self.gameplay.as_mut(),
            Phase::SceneMutation => self.scene_mutation.as_mut(),
            Phase::TransformPropagation => self.transform_propagation.as_mut(),
            Phase::PostParallel => self.post_parallel.as_mut(),
            Phase::FrameGraph => self.frame_graph.as_mut(),
            _ => None,
        }
    }
}

/// A registered participant in the frame pipeline.
///
/// Construct with [`ModuleRecord::new`] and attach hooks with the `on_*`
/// builder methods; unused hooks cost nothing.
pub struct ModuleRecord {
    pub name: String,
    pub priority: Priority,
    pub phases: PhaseSet,
    pub hooks: HookTable,
}

impl ModuleRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, priority: Priority, phases: PhaseSet) -> Self {
        Self {
            name: name.into(),
            priority,
            phases,
            hooks: HookTable::default(),
        }
    }

    #[must_use]
    pub fn on_initialize(mut self, hook: LifecycleHook) -> Self {
        self.hooks.initialize = Some(hook);
        self
    }

    #[must_use]
    pub fn on_shutdown(mut self, hook: LifecycleHook) -> Self {
        self.hooks.shutdown = Some(hook);
        self
    }

    #[must_use]
    pub fn on_gameplay(mut self, hook: OrderedHook) -> Self {
        self.hooks.gameplay = Some(hook);
        self
    }

    #[must_use]
    pub fn on_transform_propagation(mut self, hook: OrderedHook) -> Self {
        self.hooks.transform_propagation = Some(hook);
        self
    }

    #[must_use]
    pub fn on_post_parallel(mut self, hook: OrderedHook) -> Self {
        self.hooks.post_parallel = Some(hook);
        self
    }

    #[must_use]
    pub fn on_frame_graph(mut self, hook: OrderedHook) -> Self {
        self.hooks.frame_graph = Some(hook);
        self
    }

    /// Generic ordered-phase attachment, for phases without a dedicated
    /// `on_*` convenience method above.
    #[must_use]
    pub fn on_ordered(mut self, phase: Phase, hook: OrderedHook) -> Self {
        match phase {
            Phase::Input => self.hooks.input = Some(hook),
            Phase::NetworkReconciliation => self.hooks.network_reconciliation = Some(hook),
            Phase::RandomSeedManagement => self.hooks.random_seed_management = Some(hook),
            Phase::FixedSimulation => self.hooks.fixed_simulation = Some(hook),
            Phase::SceneMutation => self.hooks.scene_mutation = Some(hook),
            other => panic!("phase {other:?} is not an ordered phase with a generic hook slot"),
        }
        self
    }

    #[must_use]
    pub fn on_parallel_work(mut self, hook: ParallelHook) -> Self {
        self.hooks.parallel_work = Some(hook);
        self
    }

    #[must_use]
    pub fn on_async_work(mut self, hook: AsyncWorkHook) -> Self {
        self.hooks.async_work = Some(hook);
        self
    }

    /// Mutable access to the ordered hook for `phase`, if both the module
    /// declares the phase and it has a hook registered.
    pub(crate) fn ordered_hook_mut(&mut self, phase: Phase) -> Option<&mut OrderedHook> {
        if !self.phases.supports(phase) {
            return None;
        }
        self.hooks.ordered_hook_mut(phase)
    }

    /// Mutable access to the async-dispatch hook, if the module declares
    /// [`PhaseSet::ASYNC_WORK`] and has one registered.
    pub(crate) fn async_work_hook_mut(&mut self) -> Option<&mut AsyncWorkHook> {
        if !self.phases.contains(PhaseSet::ASYNC_WORK) {
            return None;
        }
        self.hooks.async_work.as_mut()
    }

    #[must_use]
    pub(crate) fn supports(&self, phase: Phase) -> bool {
        self.phases.supports(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_set_supports_only_declared_phases() {
        let set = PhaseSet::GAMEPLAY | PhaseSet::TRANSFORM_PROPAGATION;
        assert!(set.supports(Phase::Gameplay));
        assert!(set.supports(Phase::TransformPropagation));
        assert!(!set.supports(Phase::Input));
    }

    #[test]
    fn module_with_no_supported_phases_has_no_bits() {
        let module = ModuleRecord::new("idle", Priority::NORMAL, PhaseSet::empty());
        for phase in crate::orchestrator::phase::PHASE_ORDER {
            assert!(!module.supports(phase));
        }
    }

    #[test]
    fn priority_ordering_matches_convention() {
        assert!(Priority::CRITICAL < Priority::HIGH);
        assert!(Priority::HIGH < Priority::NORMAL);
        assert!(Priority::NORMAL < Priority::LOW);
        assert!(Priority::LOW < Priority::BACKGROUND);
    }
}
