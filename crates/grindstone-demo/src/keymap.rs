//! Key decoding: maps frontend key presses to engine input intents.
//!
//! One-shot keys decode through [`action_for_key`]. Movement is held-key
//! state, tracked by [`MoveKeys`] and re-submitted every frame so the
//! engine's latched axis follows what is actually held.

use grindstone_core::fixed::{Fixed64, f64_to_fixed64};
use grindstone_core::input::InputIntent;
use grindstone_core::overlay::Panel;

/// A pressed key, as reported by whatever frontend drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Up,
    Down,
    Left,
    Right,
}

/// What a decoded key press should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    /// Queue an intent into the engine.
    Intent(InputIntent),
    /// Report the current auto-loot state.
    ProbeAutoLoot,
}

/// Decode a one-shot key press. Movement keys are handled by [`MoveKeys`];
/// unknown keys decode to `None`.
pub fn action_for_key(key: Key) -> Option<KeyAction> {
    match key {
        Key::Char('r') => Some(KeyAction::Intent(InputIntent::TogglePanel(Panel::Research))),
        Key::Char('i') => Some(KeyAction::Intent(InputIntent::TogglePanel(Panel::Inventory))),
        Key::Char('f') => Some(KeyAction::Intent(InputIntent::TogglePanel(Panel::Facilities))),
        Key::Char('c') => Some(KeyAction::Intent(InputIntent::TogglePanel(Panel::Character))),
        Key::Char('o') => Some(KeyAction::Intent(InputIntent::TogglePanel(Panel::Settings))),
        Key::Escape => Some(KeyAction::Intent(InputIntent::Escape)),
        Key::Char(' ') => Some(KeyAction::Intent(InputIntent::GainXp {
            base: f64_to_fixed64(10.0),
        })),
        Key::Char('p') => Some(KeyAction::Intent(InputIntent::GrantPoints {
            amount: f64_to_fixed64(100.0),
        })),
        Key::Char('l') => Some(KeyAction::ProbeAutoLoot),
        _ => None,
    }
}

/// Held-key state for the movement axis.
///
/// Arrow keys and WASD both drive it. Opposing keys cancel; the composed
/// axis is pre-normalized so diagonals move at the same speed as
/// cardinals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl MoveKeys {
    /// Record a key press. Returns true if the key was a movement key.
    pub fn press(&mut self, key: Key) -> bool {
        self.set(key, true)
    }

    /// Record a key release. Returns true if the key was a movement key.
    pub fn release(&mut self, key: Key) -> bool {
        self.set(key, false)
    }

    fn set(&mut self, key: Key, held: bool) -> bool {
        match key {
            Key::Up | Key::Char('w') => self.up = held,
            Key::Down | Key::Char('s') => self.down = held,
            Key::Left | Key::Char('a') => self.left = held,
            Key::Right | Key::Char('d') => self.right = held,
            _ => return false,
        }
        true
    }

    /// Whether any movement key is held.
    pub fn any_held(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// The movement intent for the current held set. A zero axis is still
    /// an intent: it clears the engine's latched axis.
    pub fn intent(&self) -> InputIntent {
        let x = axis_component(self.right, self.left);
        let y = axis_component(self.up, self.down);

        if x != Fixed64::ZERO && y != Fixed64::ZERO {
            let diag = f64_to_fixed64(std::f64::consts::FRAC_1_SQRT_2);
            return InputIntent::Move {
                x: if x > Fixed64::ZERO { diag } else { -diag },
                y: if y > Fixed64::ZERO { diag } else { -diag },
            };
        }

        InputIntent::Move { x, y }
    }
}

fn axis_component(positive: bool, negative: bool) -> Fixed64 {
    match (positive, negative) {
        (true, false) => Fixed64::ONE,
        (false, true) => -Fixed64::ONE,
        _ => Fixed64::ZERO,
    }
}
