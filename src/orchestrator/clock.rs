//! `ClockAndBudget`: frame pacing and budget-hysteresis hinting.
//!
//! Grounded in the engine's `utils::fps_counter::FpsCounter` (a running
//! accumulator reset once per second) and `utils::time::Time` (frame-delta
//! tracking); this component folds both into a single exponential moving
//! average over `budget_ema_samples` frames (spec §4.8) instead of a
//! fixed one-second window, since the orchestrator needs a hint every
//! frame rather than once a second.

use std::time::{Duration, Instant};

/// A hint about whether the frame budget is under or over pressure,
/// produced once per frame from the EMA of recent frame durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetHint {
    /// Recent frames are comfortably under budget; safe to take on more
    /// optional async work per tick.
    Upgrade,
    /// Recent frames are within tolerance of the target interval.
    Hold,
    /// Recent frames are over budget; shed optional work.
    Degrade,
}

/// Tracks frame timing and derives pacing/budget decisions.
///
/// Not `Send`-restricted by any lock: owned exclusively by the
/// orchestrator's frame-drive loop, never shared across threads.
pub struct ClockAndBudget {
    target_interval: Option<Duration>,
    ema_alpha: f64,
    ema_seconds: Option<f64>,
    frame_start: Option<Instant>,
}

impl ClockAndBudget {
    #[must_use]
    pub fn new(target_interval: Option<Duration>, ema_samples: usize) -> Self {
        let samples = ema_samples.max(1) as f64;
        Self {
            target_interval,
            // Standard EMA smoothing factor for an N-sample window.
            ema_alpha: 2.0 / (samples + 1.0),
            ema_seconds: None,
            frame_start: None,
        }
    }

    /// Marks the start of a frame (spec §4.1, `FrameStart`).
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Records the frame's measured duration into the EMA and returns a
    /// [`BudgetHint`]. Must be called once per frame after `begin_frame`.
    pub fn end_frame(&mut self) -> BudgetHint {
        let elapsed = self
            .frame_start
            .map_or(Duration::ZERO, |start| start.elapsed())
            .as_secs_f64();

        self.ema_seconds = Some(match self.ema_seconds {
            Some(prev) => self.ema_alpha.mul_add(elapsed - prev, prev),
            None => elapsed,
        });

        self.hint()
    }

    fn hint(&self) -> BudgetHint {
        let Some(target) = self.target_interval else {
            return BudgetHint::Hold;
        };
        let Some(ema) = self.ema_seconds else {
            return BudgetHint::Hold;
        };
        let target_secs = target.as_secs_f64();
        if target_secs <= 0.0 {
            return BudgetHint::Hold;
        }

        let ratio = ema / target_secs;
        if ratio > 1.05 {
            BudgetHint::Degrade
        } else if ratio < 0.8 {
            BudgetHint::Upgrade
        } else {
            BudgetHint::Hold
        }
    }

    #[must_use]
    pub fn ema_frame_time(&self) -> Option<Duration> {
        self.ema_seconds.map(Duration::from_secs_f64)
    }

    /// How long to sleep to hit `target_interval`, given the time already
    /// spent this frame. `None` if there is no target or the frame already
    /// overran it.
    #[must_use]
    pub fn pacing_sleep(&self) -> Option<Duration> {
        let target = self.target_interval?;
        let start = self.frame_start?;
        target.checked_sub(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_with_no_target_interval() {
        let mut clock = ClockAndBudget::new(None, 16);
        clock.begin_frame();
        assert_eq!(clock.end_frame(), BudgetHint::Hold);
    }

    #[test]
    fn ema_is_none_before_first_frame() {
        let clock = ClockAndBudget::new(Some(Duration::from_millis(16)), 16);
        assert!(clock.ema_frame_time().is_none());
    }

    #[test]
    fn first_recorded_frame_seeds_the_ema_directly() {
        let mut clock = ClockAndBudget::new(Some(Duration::from_millis(16)), 16);
        clock.begin_frame();
        clock.end_frame();
        assert!(clock.ema_frame_time().is_some());
    }

    #[test]
    fn pacing_sleep_none_without_target() {
        let mut clock = ClockAndBudget::new(None, 16);
        clock.begin_frame();
        assert!(clock.pacing_sleep().is_none());
    }
}
