//! Input intents: the decoded commands a frontend queues into the engine.
//!
//! Intents are applied at the start of the next step, in submission order.
//! Key decoding lives outside the core; unknown keys never produce an
//! intent.

use crate::fixed::Fixed64;
use crate::overlay::Panel;

/// A decoded input command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputIntent {
    /// Open the panel, or close it if it is already open.
    TogglePanel(Panel),
    /// Dismiss whatever is open, or summon the default panel.
    Escape,
    /// Continuous 2D movement axis. Latched until the next `Move`; ignored
    /// while the overlay blocks input (evaluated each step, not at submit).
    Move { x: Fixed64, y: Fixed64 },
    /// Grant experience at the player's current multiplier.
    GainXp { base: Fixed64 },
    /// Grant research points directly (debug hook).
    GrantPoints { amount: Fixed64 },
}
