//! Player actor: position integration and research-granted effects.
//!
//! Movement is driven by a latched 2D axis the engine applies once per step.
//! The axis is normalized so diagonals are no faster than cardinals;
//! sub-unit analog deflection is preserved. Effects arrive only through
//! research unlocks.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::fixed::{Fixed64, Ticks, checked_div_64, sqrt_64};
use crate::research::{EffectKind, ResearchId};

/// Maximum health before research bonuses.
pub const BASE_MAX_HEALTH: Fixed64 = Fixed64::from_bits(100i64 << 32);

/// 2D world position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: Fixed64,
    pub y: Fixed64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    position: Position,
    /// Units per second.
    move_speed: Fixed64,
    /// Distance covered per step along a unit axis.
    per_tick: Fixed64,

    xp_multiplier: Fixed64,
    auto_loot: bool,
    max_health_bonus: Fixed64,

    /// Events recorded this step, drained by the engine.
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl Player {
    pub fn new(move_speed: Fixed64, ticks_per_second: u32) -> Self {
        let tps = Fixed64::from_num(ticks_per_second.max(1));
        Self {
            position: Position::default(),
            move_speed,
            per_tick: checked_div_64(move_speed, tps).unwrap_or(Fixed64::ZERO),
            xp_multiplier: Fixed64::ONE,
            auto_loot: false,
            max_health_bonus: Fixed64::ZERO,
            pending_events: Vec::new(),
        }
    }

    /// Advance position along the given axis for one step.
    ///
    /// Components are clamped to [-1, 1]; an axis longer than a unit vector
    /// is scaled back to length 1 so diagonal movement is not faster.
    /// Movement emits no events.
    pub fn apply_move(&mut self, axis_x: Fixed64, axis_y: Fixed64) {
        let mut x = axis_x.clamp(-Fixed64::ONE, Fixed64::ONE);
        let mut y = axis_y.clamp(-Fixed64::ONE, Fixed64::ONE);
        if x == Fixed64::ZERO && y == Fixed64::ZERO {
            return;
        }

        let mag2 = x.saturating_mul(x).saturating_add(y.saturating_mul(y));
        if mag2 > Fixed64::ONE {
            // len is at least 1 here, so the divisions stay in range.
            if let Some(len) = sqrt_64(mag2) {
                x = checked_div_64(x, len).unwrap_or(Fixed64::ZERO);
                y = checked_div_64(y, len).unwrap_or(Fixed64::ZERO);
            }
        }

        self.position.x = self.position.x.saturating_add(x.saturating_mul(self.per_tick));
        self.position.y = self.position.y.saturating_add(y.saturating_mul(self.per_tick));
    }

    /// Apply a research-granted effect. Records an `EffectApplied` event.
    pub fn apply_effect(&mut self, id: ResearchId, effect: EffectKind, tick: Ticks) {
        match effect {
            EffectKind::AutoLoot => self.auto_loot = true,
            EffectKind::XpRate { multiplier } => self.xp_multiplier = multiplier,
            EffectKind::MaxHealth { bonus } => self.max_health_bonus = bonus,
        }
        self.pending_events.push(Event::EffectApplied { id, effect, tick });
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn move_speed(&self) -> Fixed64 {
        self.move_speed
    }

    /// Factor applied to every XP gain. 1 until an `XpRate` research unlocks.
    pub fn xp_multiplier(&self) -> Fixed64 {
        self.xp_multiplier
    }

    pub fn auto_loot(&self) -> bool {
        self.auto_loot
    }

    pub fn max_health(&self) -> Fixed64 {
        BASE_MAX_HEALTH.saturating_add(self.max_health_bonus)
    }

    pub fn max_health_bonus(&self) -> Fixed64 {
        self.max_health_bonus
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

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed64_to_f64;
    use crate::test_utils::fixed;

    fn displacement(p: &Player) -> f64 {
        let x = fixed64_to_f64(p.position().x);
        let y = fixed64_to_f64(p.position().y);
        (x * x + y * y).sqrt()
    }

    // -----------------------------------------------------------------------
    // Test 1: Defaults
    // -----------------------------------------------------------------------
    #[test]
    fn defaults() {
        let player = Player::new(fixed(5.0), 1);
        assert_eq!(player.position(), Position::default());
        assert_eq!(player.move_speed(), fixed(5.0));
        assert_eq!(player.xp_multiplier(), Fixed64::ONE);
        assert!(!player.auto_loot());
        assert_eq!(player.max_health(), fixed(100.0));
    }

    // -----------------------------------------------------------------------
    // Test 2: Cardinal movement covers speed/tps per step
    // -----------------------------------------------------------------------
    #[test]
    fn cardinal_movement() {
        let mut player = Player::new(fixed(5.0), 1);
        for _ in 0..3 {
            player.apply_move(Fixed64::ONE, Fixed64::ZERO);
        }
        assert_eq!(player.position().x, fixed(15.0));
        assert_eq!(player.position().y, Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 3: Diagonal movement is normalized, not sqrt(2) faster
    // -----------------------------------------------------------------------
    #[test]
    fn diagonal_normalized() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_move(Fixed64::ONE, Fixed64::ONE);

        assert_eq!(player.position().x, player.position().y);
        let dist = displacement(&player);
        assert!((dist - 5.0).abs() < 1e-6, "distance {dist}");
    }

    // -----------------------------------------------------------------------
    // Test 4: Sub-unit analog deflection is preserved
    // -----------------------------------------------------------------------
    #[test]
    fn sub_unit_axis_preserved() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_move(fixed(0.5), Fixed64::ZERO);

        assert_eq!(player.position().x, fixed(2.5));
    }

    // -----------------------------------------------------------------------
    // Test 5: Components beyond [-1, 1] are clamped
    // -----------------------------------------------------------------------
    #[test]
    fn oversized_axis_clamped() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_move(fixed(3.0), Fixed64::ZERO);

        assert_eq!(player.position().x, fixed(5.0));
    }

    // -----------------------------------------------------------------------
    // Test 6: Zero axis does not move
    // -----------------------------------------------------------------------
    #[test]
    fn zero_axis_no_move() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_move(Fixed64::ZERO, Fixed64::ZERO);
        assert_eq!(player.position(), Position::default());
    }

    // -----------------------------------------------------------------------
    // Test 7: Negative axis moves in the negative direction
    // -----------------------------------------------------------------------
    #[test]
    fn negative_axis() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_move(Fixed64::ZERO, -Fixed64::ONE);
        assert_eq!(player.position().y, fixed(-5.0));
    }

    // -----------------------------------------------------------------------
    // Test 8: ticks_per_second divides the per-step distance
    // -----------------------------------------------------------------------
    #[test]
    fn tps_divides_step_distance() {
        let mut player = Player::new(fixed(5.0), 5);
        player.apply_move(Fixed64::ONE, Fixed64::ZERO);
        assert_eq!(player.position().x, Fixed64::ONE);
    }

    // -----------------------------------------------------------------------
    // Test 9: AutoLoot effect sets the flag and records the event
    // -----------------------------------------------------------------------
    #[test]
    fn auto_loot_effect() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_effect(ResearchId(0), EffectKind::AutoLoot, 3);

        assert!(player.auto_loot());
        assert_eq!(
            player.drain_events(),
            vec![Event::EffectApplied {
                id: ResearchId(0),
                effect: EffectKind::AutoLoot,
                tick: 3,
            }]
        );
    }

    // -----------------------------------------------------------------------
    // Test 10: XpRate effect replaces the multiplier
    // -----------------------------------------------------------------------
    #[test]
    fn xp_rate_effect() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_effect(
            ResearchId(1),
            EffectKind::XpRate {
                multiplier: fixed(1.1),
            },
            0,
        );
        assert_eq!(player.xp_multiplier(), fixed(1.1));
    }

    // -----------------------------------------------------------------------
    // Test 11: MaxHealth effect adds on top of the base
    // -----------------------------------------------------------------------
    #[test]
    fn max_health_effect() {
        let mut player = Player::new(fixed(5.0), 1);
        player.apply_effect(
            ResearchId(2),
            EffectKind::MaxHealth {
                bonus: fixed(25.0),
            },
            0,
        );
        assert_eq!(player.max_health(), fixed(125.0));
        assert_eq!(player.max_health_bonus(), fixed(25.0));
    }
}
