//! Orchestrator configuration.

/// Tunable knobs for an [`Orchestrator`](crate::orchestrator::Orchestrator) run.
///
/// Mirrors the way the engine's renderer takes a `RendererSettings` value at
/// construction rather than reading globals.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Target frames per second. `0` disables pacing — frames run as fast
    /// as possible.
    pub target_fps: u32,
    /// Minimum number of frames between a resource's submission and its
    /// eligibility for reclamation. Spec default is 2; see design notes for
    /// why this is not lowered to 1.
    pub safety_delay: u64,
    /// Maximum number of async job completions integrated per `AsyncPoll`
    /// tick, bounding per-frame cost.
    pub async_budget_per_tick: usize,
    /// Soft threshold on the reclaimer's pending queue length above which a
    /// diagnostic is emitted (no functional impact).
    pub reclaim_soft_threshold: usize,
    /// Sample count for the budget hysteresis EMA.
    pub budget_ema_samples: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            safety_delay: 2,
            async_budget_per_tick: 8,
            reclaim_soft_threshold: 256,
            budget_ema_samples: 16,
        }
    }
}

impl OrchestratorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    #[must_use]
    pub fn with_safety_delay(mut self, delay: u64) -> Self {
        self.safety_delay = delay;
        self
    }

    #[must_use]
    pub fn with_async_budget_per_tick(mut self, budget: usize) -> Self {
        self.async_budget_per_tick = budget;
        self
    }

    /// Target interval between frame starts, or `None` when uncapped.
    #[must_use]
    pub fn target_interval(&self) -> Option<std::time::Duration> {
        if self.target_fps == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs_f64(
                1.0 / f64::from(self.target_fps),
            ))
        }
    }
}
