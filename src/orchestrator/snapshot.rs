//! Snapshot publication: the bridge from ordered game-state mutation to
//! parallel, read-only consumption.
//!
//! Two cooperating types, per spec §3:
//!
//! - [`GameStateSnapshot`] is the heavy, shared, immutable container. Its
//!   lifetime can exceed the frame that produced it if a parallel worker is
//!   still holding a clone of the `Arc`.
//! - [`FrameSnapshot`] is the lightweight, `Copy`-cheap cursor handed to
//!   parallel tasks: just the frame identity plus a clone of the `Arc`.
//!
//! Publication lives in a double buffer — two slots behind an
//! `AtomicUsize` `visible_index` — so that a reader who caches the pointer
//! at capture time keeps seeing consistent data even if the publisher swaps
//! slots mid-read (spec §4.6's "readers must cache the pointer at capture
//! time, not re-read `visible_index` mid-use").
//!
//! The `AtomicU64`-issues-a-monotonic-id pattern this double buffer borrows
//! its ordering discipline from is the engine's own
//! `renderer::core::resources::Tracked<T>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::FxHashMap;

use crate::orchestrator::frame::{Epoch, FrameIndex};

/// One subsystem's slice of a published snapshot, as a byte range into that
/// subsystem's backing array. Kept untyped here since the orchestrator core
/// does not know concrete game-state types; callers downcast via their own
/// subsystem keys.
#[derive(Debug, Clone)]
pub struct SubsystemSpan {
    pub offset: usize,
    pub len: usize,
}

/// The heavy, immutable, per-frame container of game-state data.
///
/// Built once per frame at the `Snapshot` phase and shared (via `Arc`) with
/// every parallel task that reads it. Mutable per-entity arrays are copied
/// in; large immutable asset data may be shared by reference — this type
/// only prescribes ownership of the per-frame copy, not of what the copy
/// points to.
#[derive(Debug, Default)]
pub struct GameStateSnapshot {
    pub frame_index: FrameIndex,
    pub epoch: Epoch,
    /// Flat backing storage for whatever per-entity arrays were copied in
    /// this frame (transforms, particle state, ...). Subsystems interpret
    /// their own `SubsystemSpan` within it.
    pub data: Vec<u8>,
    pub spans: FxHashMap<&'static str, SubsystemSpan>,
    /// Scalar counters copied out of `GameState` at publication time.
    /// Kept as a typed map rather than packed into `data`/`spans` since,
    /// unlike fixed per-entity arrays, counter keys are caller-defined at
    /// runtime and have no `'static` name to key a span on.
    pub counters: FxHashMap<String, i64>,
}

impl GameStateSnapshot {
    #[must_use]
    pub fn span(&self, subsystem: &str) -> Option<&[u8]> {
        let span = self.spans.get(subsystem)?;
        self.data.get(span.offset..span.offset + span.len)
    }
}

/// A cheap, `Clone`-able cursor into a [`GameStateSnapshot`], passed by
/// value to parallel tasks.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame_index: FrameIndex,
    pub epoch: Epoch,
    state: Arc<GameStateSnapshot>,
}

impl FrameSnapshot {
    #[must_use]
    pub fn subsystem(&self, name: &str) -> Option<&[u8]> {
        self.state.span(name)
    }

    #[must_use]
    pub fn counter(&self, key: &str) -> Option<i64> {
        self.state.counters.get(key).copied()
    }

    #[must_use]
    pub fn game_state(&self) -> &GameStateSnapshot {
        &self.state
    }
}

/// Double buffer of snapshot slots with atomic publication.
///
/// Invariant 2 (spec §3): `visible_index` only changes during the
/// `Snapshot` phase, and only via [`SnapshotPublisher::publish`].
pub struct SnapshotPublisher {
    slots: [parking_lot::Mutex<Option<Arc<GameStateSnapshot>>>; 2],
    visible_index: AtomicUsize,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [
                parking_lot::Mutex::new(None),
                parking_lot::Mutex::new(None),
            ],
            visible_index: AtomicUsize::new(0),
        }
    }

    /// Builds and publishes a new snapshot into the inactive slot, then
    /// atomically swaps `visible_index` so readers observe it. Returns the
    /// [`FrameSnapshot`] cursor for the orchestrator's own use this frame.
    ///
    /// Release ordering on the store; [`SnapshotPublisher::current`] uses
    /// acquire on the load, establishing happens-before with any reader
    /// that subsequently reads the slot contents (spec §4.6).
    pub fn publish(&self, snapshot: GameStateSnapshot) -> FrameSnapshot {
        let frame_index = snapshot.frame_index;
        let epoch = snapshot.epoch;
        let state = Arc::new(snapshot);

        let current = self.visible_index.load(Ordering::Acquire);
        let inactive = 1 - current;
        *self.slots[inactive].lock() = Some(Arc::clone(&state));
        self.visible_index.store(inactive, Ordering::Release);

        FrameSnapshot {
            frame_index,
            epoch,
            state,
        }
    }

    /// Returns the currently visible snapshot, or `None` before the first
    /// publication.
    #[must_use]
    pub fn current(&self) -> Option<FrameSnapshot> {
        let index = self.visible_index.load(Ordering::Acquire);
        let state = self.slots[index].lock().clone()?;
        Some(FrameSnapshot {
            frame_index: state.frame_index,
            epoch: state.epoch,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(frame: u64) -> GameStateSnapshot {
        GameStateSnapshot {
            frame_index: FrameIndex(frame),
            epoch: Epoch(0),
            data: vec![42],
            spans: FxHashMap::default(),
            counters: FxHashMap::default(),
        }
    }

    #[test]
    fn publish_then_current_returns_same_contents() {
        let publisher = SnapshotPublisher::new();
        let published = publisher.publish(snapshot(7));
        let read = publisher.current().expect("snapshot published");
        assert_eq!(read.frame_index, published.frame_index);
        assert!(Arc::ptr_eq(&read.game_state_arc(), &published.game_state_arc()));
    }

    #[test]
    fn publishing_again_does_not_mutate_a_previously_captured_cursor() {
        let publisher = SnapshotPublisher::new();
        let first = publisher.publish(snapshot(1));
        let _second = publisher.publish(snapshot(2));
        // the cursor captured before the second publish still points at
        // frame 1's contents, bit-for-bit.
        assert_eq!(first.frame_index, FrameIndex(1));
        assert_eq!(first.game_state().data, vec![42]);
    }

    #[test]
    fn current_is_none_before_first_publication() {
        let publisher = SnapshotPublisher::new();
        assert!(publisher.current().is_none());
    }
}

impl FrameSnapshot {
    #[cfg(test)]
    fn game_state_arc(&self) -> Arc<GameStateSnapshot> {
        Arc::clone(&self.state)
    }
}
