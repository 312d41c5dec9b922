//! Graphics backend seam.
//!
//! The orchestrator never talks to a real GPU API directly (spec §1
//! Non-goals: no wgpu/vulkan/command-buffer plumbing). Instead it drives an
//! abstract [`GraphicsFacade`] that owns the resource registry, descriptor
//! table and deferred reclaimer, and reports frame completion. Grounded in
//! the engine's own split between `renderer::core` (device-owned resources)
//! and the higher-level frame loop that only ever calls through a narrow
//! trait boundary; [`SimulatedGraphicsFacade`] stands in for a real backend
//! the way a headless renderer would in the engine's own test harness.

use crate::orchestrator::descriptor::DescriptorTable;
use crate::orchestrator::frame::FrameIndex;
use crate::orchestrator::reclaim::DeferredReclaimer;
use crate::orchestrator::registry::ResourceRegistry;

/// A presentable render target. Cost-estimate fields are bookkeeping only —
/// no real swapchain is ever created (spec §1 Non-goals).
#[derive(Debug, Clone)]
pub struct Surface {
    pub name: String,
    pub commands_recorded: bool,
    pub commands_submitted: bool,
}

impl Surface {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands_recorded: false,
            commands_submitted: false,
        }
    }
}

/// Abstract graphics backend. The orchestrator owns one and never reaches
/// past it into concrete GPU resources.
pub trait GraphicsFacade: Send + Sync {
    fn resource_registry(&self) -> &ResourceRegistry;
    fn descriptor_allocator(&self) -> &DescriptorTable;
    fn deferred_reclaimer(&self) -> &DeferredReclaimer;

    /// Called once per frame before any module hook runs.
    fn begin_frame(&self, frame_index: FrameIndex);

    /// Records commands for one surface during `CommandRecord`. Dispatched
    /// per-surface onto the `ThreadPool` and joined before `Present`, the
    /// way the engine's own per-view render graph execution fans out across
    /// render targets. Returns whether recording succeeded.
    fn record_surface(&self, surface_name: &str) -> bool;

    /// Called after `CommandRecord`; marks submission of whatever surfaces
    /// have `commands_recorded = true`.
    fn present_surfaces(&self, surfaces: &mut [Surface]);

    /// The most recent frame the backend considers fully retired (its
    /// fences signaled), or `None` if no frame has retired yet (the first
    /// `safety_delay` frames of a run). Drives
    /// [`DeferredReclaimer::process_completed_frame`].
    fn completed_frame(&self) -> Option<FrameIndex>;
}

/// A facade with no real backend: completion always trails submission by a
/// fixed `safety_delay`, modeling a GPU that finishes frames in submission
/// order after a bounded pipeline depth (spec §4.9's simulated
/// implementation note).
pub struct SimulatedGraphicsFacade {
    registry: ResourceRegistry,
    descriptors: DescriptorTable,
    reclaimer: DeferredReclaimer,
    safety_delay: u64,
    current_frame: std::sync::atomic::AtomicU64,
}

impl SimulatedGraphicsFacade {
    #[must_use]
    pub fn new(safety_delay: u64, reclaim_soft_threshold: usize) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            descriptors: DescriptorTable::new(),
            reclaimer: DeferredReclaimer::new(reclaim_soft_threshold),
            safety_delay,
            current_frame: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl GraphicsFacade for SimulatedGraphicsFacade {
    fn resource_registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    fn descriptor_allocator(&self) -> &DescriptorTable {
        &self.descriptors
    }

    fn deferred_reclaimer(&self) -> &DeferredReclaimer {
        &self.reclaimer
    }

    fn begin_frame(&self, frame_index: FrameIndex) {
        self.current_frame
            .store(frame_index.0, std::sync::atomic::Ordering::Release);
    }

    fn record_surface(&self, _surface_name: &str) -> bool {
        true
    }

    fn present_surfaces(&self, surfaces: &mut [Surface]) {
        for surface in surfaces {
            if surface.commands_recorded {
                surface.commands_submitted = true;
            }
        }
    }

    fn completed_frame(&self) -> Option<FrameIndex> {
        let current = self.current_frame.load(std::sync::atomic::Ordering::Acquire);
        current.checked_sub(self.safety_delay).map(FrameIndex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_frame_trails_current_by_safety_delay() {
        let facade = SimulatedGraphicsFacade::new(2, 256);
        facade.begin_frame(FrameIndex(5));
        assert_eq!(facade.completed_frame(), Some(FrameIndex(3)));
    }

    #[test]
    fn completed_frame_is_none_before_the_safety_delay_has_elapsed() {
        let facade = SimulatedGraphicsFacade::new(2, 256);
        facade.begin_frame(FrameIndex(1));
        assert_eq!(facade.completed_frame(), None);
    }

    #[test]
    fn present_surfaces_only_submits_recorded_ones() {
        let facade = SimulatedGraphicsFacade::new(0, 256);
        let mut surfaces = vec![Surface::new("main"), Surface::new("shadow")];
        surfaces[0].commands_recorded = true;
        facade.present_surfaces(&mut surfaces);
        assert!(surfaces[0].commands_submitted);
        assert!(!surfaces[1].commands_submitted);
    }
}
