//! `DescriptorTable`: lock-free slot allocation with versioned publication.
//!
//! Allocation is a lock-free monotonic bump of `next_slot` (an `AtomicU32`).
//! Publication is a separate step that records the monotonic version at
//! which every prior allocation becomes visible to the GPU (spec invariant
//! 6, §4.10); only the ordered `DescriptorPublication` sub-phase (modeled
//! as part of `FrameGraph`, see [`Orchestrator`](crate::orchestrator::Orchestrator))
//! may call [`DescriptorTable::publish`].
//!
//! Grounded in `renderer::core::resources::tracked::Tracked<T>`'s global
//! `AtomicU64` monotonic-id generator, generalized here into a two-counter
//! allocate/publish pair.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// An allocated descriptor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSlot(pub u32);

/// Lock-free bump allocator plus a monotonic publication version.
#[derive(Debug, Default)]
pub struct DescriptorTable {
    next_slot: AtomicU32,
    published_slot_count: AtomicU32,
    version: AtomicU64,
}

impl DescriptorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next slot. Lock-free; safe to call from any thread.
    pub fn allocate(&self) -> DescriptorSlot {
        DescriptorSlot(self.next_slot.fetch_add(1, Ordering::Relaxed))
    }

    /// Records the monotonic version at which every slot allocated so far
    /// becomes visible to readers. Returns the new version.
    ///
    /// Per invariant 6: a reader observing version `V` sees the full set
    /// that was present at publication of `V` — this holds because
    /// `published_slot_count` is stored with the same `AcqRel` fence as
    /// `version`, and allocation only ever increases `next_slot`.
    pub fn publish(&self) -> u64 {
        let allocated = self.next_slot.load(Ordering::Acquire);
        self.published_slot_count.store(allocated, Ordering::Release);
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[must_use]
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// The number of slots visible as of the last publication.
    #[must_use]
    pub fn published_slot_count(&self) -> u32 {
        self.published_slot_count.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_monotonic() {
        let table = DescriptorTable::new();
        let a = table.allocate();
        let b = table.allocate();
        assert_eq!(a.0 + 1, b.0);
    }

    #[test]
    fn publish_bumps_version_and_captures_allocated_count() {
        let table = DescriptorTable::new();
        assert_eq!(table.current_version(), 0);
        table.allocate();
        table.allocate();
        let v1 = table.publish();
        assert_eq!(v1, 1);
        assert_eq!(table.published_slot_count(), 2);

        table.allocate();
        let v2 = table.publish();
        assert_eq!(v2, 2);
        assert_eq!(table.published_slot_count(), 3);
    }

    #[test]
    fn allocations_after_publication_are_not_yet_visible() {
        let table = DescriptorTable::new();
        table.allocate();
        table.publish();
        table.allocate(); // not yet published
        assert_eq!(table.published_slot_count(), 1);
    }
}
