//! Phase enumeration and pipeline ordering.
//!
//! `Phase` defines the fixed, totally ordered sequence a frame advances
//! through. Each phase is tagged with a [`PhaseKind`] describing its
//! dispatch discipline. Implementers must not reorder or skip phases
//! without also updating the barrier contract (spec §4.2).

/// How a phase's participating modules are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Modules run on the orchestrator thread, in priority order, one at a
    /// time. May suspend awaiting a `ThreadPool` offload.
    Ordered,
    /// Modules run on the orchestrator thread, in priority order, and must
    /// not suspend (no `.await` points besides trivial ones).
    OrderedSynchronous,
    /// Modules run concurrently on worker threads, joined at a barrier.
    Parallel,
    /// No module dispatch; a fixed orchestrator-internal step.
    Internal,
}

/// The sixteen named phases of a frame, in pipeline order.
///
/// Ordinal values double as the canonical ordering used by invariant checks
/// and by [`Phase::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    FrameStart = 0,
    Input = 1,
    NetworkReconciliation = 2,
    RandomSeedManagement = 3,
    FixedSimulation = 4,
    Gameplay = 5,
    SceneMutation = 6,
    TransformPropagation = 7,
    Snapshot = 8,
    ParallelWork = 9,
    PostParallel = 10,
    FrameGraph = 11,
    CommandRecord = 12,
    Present = 13,
    AsyncPoll = 14,
    BudgetAdapt = 15,
    FrameEnd = 16,
}

/// The canonical phase order. Index into this array equals the phase's
/// ordinal (`Phase::order`).
pub const PHASE_ORDER: [Phase; 17] = [
    Phase::FrameStart,
    Phase::Input,
    Phase::NetworkReconciliation,
    Phase::RandomSeedManagement,
    Phase::FixedSimulation,
    Phase::Gameplay,
    Phase::SceneMutation,
    Phase::TransformPropagation,
    Phase::Snapshot,
    Phase::ParallelWork,
    Phase::PostParallel,
    Phase::FrameGraph,
    Phase::CommandRecord,
    Phase::Present,
    Phase::AsyncPoll,
    Phase::BudgetAdapt,
    Phase::FrameEnd,
];

impl Phase {
    /// Numeric position in the pipeline (used for sorting and invariant
    /// checks).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stable name, for diagnostics and trace logs.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FrameStart => "FrameStart",
            Self::Input => "Input",
            Self::NetworkReconciliation => "NetworkReconciliation",
            Self::RandomSeedManagement => "RandomSeedManagement",
            Self::FixedSimulation => "FixedSimulation",
            Self::Gameplay => "Gameplay",
            Self::SceneMutation => "SceneMutation",
            Self::TransformPropagation => "TransformPropagation",
            Self::Snapshot => "Snapshot",
            Self::ParallelWork => "ParallelWork",
            Self::PostParallel => "PostParallel",
            Self::FrameGraph => "FrameGraph",
            Self::CommandRecord => "CommandRecord",
            Self::Present => "Present",
            Self::AsyncPoll => "AsyncPoll",
            Self::BudgetAdapt => "BudgetAdapt",
            Self::FrameEnd => "FrameEnd",
        }
    }

    /// The phase's dispatch discipline.
    #[must_use]
    pub const fn kind(self) -> PhaseKind {
        match self {
            Self::FrameStart => PhaseKind::Internal,
            Self::Input
            | Self::NetworkReconciliation
            | Self::FixedSimulation
            | Self::Gameplay
            | Self::SceneMutation
            | Self::TransformPropagation
            | Self::PostParallel
            | Self::FrameGraph => PhaseKind::Ordered,
            Self::RandomSeedManagement | Self::Snapshot | Self::Present => {
                PhaseKind::OrderedSynchronous
            }
            Self::ParallelWork | Self::CommandRecord => PhaseKind::Parallel,
            Self::AsyncPoll | Self::BudgetAdapt | Self::FrameEnd => PhaseKind::Internal,
        }
    }

    /// Whether modules may mutate `game_state` directly while this phase is
    /// current (Category A, spec invariant 4 / §4.4).
    #[must_use]
    pub const fn is_game_state_mutable(self) -> bool {
        matches!(
            self,
            Self::Input
                | Self::NetworkReconciliation
                | Self::RandomSeedManagement
                | Self::FixedSimulation
                | Self::Gameplay
                | Self::SceneMutation
                | Self::TransformPropagation
                | Self::PostParallel
        )
    }

    /// The next phase in the sequence, wrapping to `FrameStart` after
    /// `FrameEnd` (the wrap is performed by the pipeline driver, which also
    /// advances `FrameIndex` — this method only encodes adjacency).
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        PHASE_ORDER.get(self.order() as usize + 1).copied()
    }

    /// Construct a `Phase` from its ordinal, for bounds-checked decoding of
    /// external input (spec §7's "phase enum out of range" misuse case).
    pub fn from_order(order: u8) -> crate::error::Result<Phase> {
        PHASE_ORDER
            .get(order as usize)
            .copied()
            .ok_or(crate::error::OrchestratorError::PhaseOutOfRange(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_is_monotonic_and_matches_table() {
        for (i, phase) in PHASE_ORDER.iter().enumerate() {
            assert_eq!(phase.order() as usize, i);
        }
    }

    #[test]
    fn snapshot_precedes_parallel_work_precedes_post_parallel() {
        assert!(Phase::Snapshot < Phase::ParallelWork);
        assert!(Phase::ParallelWork < Phase::PostParallel);
    }

    #[test]
    fn random_seed_management_is_after_network_reconciliation() {
        assert!(Phase::NetworkReconciliation < Phase::RandomSeedManagement);
        assert!(Phase::RandomSeedManagement < Phase::FixedSimulation);
    }

    #[test]
    fn next_wraps_to_none_after_frame_end() {
        assert_eq!(Phase::FrameEnd.next(), None);
        assert_eq!(Phase::FrameStart.next(), Some(Phase::Input));
    }

    #[test]
    fn from_order_rejects_out_of_range() {
        assert!(Phase::from_order(16).is_ok());
        assert!(Phase::from_order(17).is_err());
    }
}
