//! Level/XP progression counter.
//!
//! Pure counter with no knowledge of research: the XP multiplier is supplied
//! by the caller on every gain. A single large gain can cross several
//! thresholds; the catch-up loop runs until xp falls below the (growing)
//! threshold.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};

/// Experience counter with a geometric level threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    /// Experience toward the next level. Reduced by the threshold on each
    /// level-up, never negative.
    xp: Fixed64,
    /// Current level. Starts at 1, only increases.
    level: u32,
    /// XP required for the next level.
    threshold: Fixed64,
    /// Threshold multiplier applied on every level-up.
    growth: Fixed64,

    /// Events recorded this step, drained by the engine.
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl Progression {
    /// Threshold is clamped to at least 1 and growth to at least 1, so the
    /// catch-up loop in [`gain_xp`](Self::gain_xp) always terminates.
    pub fn new(base_threshold: Fixed64, growth_factor: Fixed64) -> Self {
        Self {
            xp: Fixed64::ZERO,
            level: 1,
            threshold: base_threshold.max(Fixed64::ONE),
            growth: growth_factor.max(Fixed64::ONE),
            pending_events: Vec::new(),
        }
    }

    /// Add experience scaled by the caller's multiplier, then level up while
    /// the threshold is met.
    ///
    /// A non-positive scaled amount is a no-op. Emits one `XpGained` with
    /// the post-add total, then one `LevelUp` per level crossed carrying the
    /// new level and the next threshold.
    pub fn gain_xp(&mut self, base: Fixed64, multiplier: Fixed64, tick: Ticks) {
        let amount = base.saturating_mul(multiplier);
        if amount <= Fixed64::ZERO {
            return;
        }

        self.xp = self.xp.saturating_add(amount);
        self.pending_events.push(Event::XpGained {
            amount,
            total: self.xp,
            tick,
        });

        while self.xp >= self.threshold {
            self.xp -= self.threshold;
            self.level = self.level.saturating_add(1);
            self.threshold = self.threshold.saturating_mul(self.growth);
            self.pending_events.push(Event::LevelUp {
                level: self.level,
                threshold: self.threshold,
                tick,
            });
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> Fixed64 {
        self.xp
    }

    /// XP required for the next level.
    pub fn threshold(&self) -> Fixed64 {
        self.threshold
    }

    /// Drain events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Peek at pending events without draining.
    pub fn pending_events(&self) -> &[Event] {
        &self.pending_events
    }
}

impl Default for Progression {
    /// Level 1, threshold 100, growth 1.2.
    fn default() -> Self {
        Self::new(f64_to_fixed64(100.0), f64_to_fixed64(1.2))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
