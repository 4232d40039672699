//! Grindstone Core -- the headless simulation core for an idle action-RPG.
//!
//! This crate provides the player actor, passive research accumulator and
//! unlock ledger, level progression, overlay panel state, typed events,
//! number formatting, the key-value profile contract, and deterministic
//! fixed-point arithmetic that every Grindstone frontend depends on.
//!
//! # Four-Phase Step Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one tick
//! through the following phases:
//!
//! 1. **Intents** -- Apply queued input intents in submission order.
//! 2. **Simulate** -- Integrate player movement from the latched axis
//!    (skipped while the overlay blocks input), then accrue research points.
//! 3. **Post** -- Pump component events into the bus, mirror overlay
//!    transitions to the panel sink, and deliver once.
//! 4. **Bookkeeping** -- Increment the tick counter and compute the state
//!    hash.
//!
//! # Input Intent Pattern
//!
//! Frontends never mutate components directly; they queue intents which
//! apply at the start of the next step:
//!
//! ```rust,ignore
//! engine.submit_intent(InputIntent::TogglePanel(Panel::Research));
//! engine.submit_intent(InputIntent::Move { x: Fixed64::ONE, y: Fixed64::ZERO });
//! let result = engine.advance(1);
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Main simulation engine and step orchestrator.
//! - [`engine::GameConfig`] -- Resolved configuration (catalog plus tuning).
//! - [`research::ResearchLab`] -- Unlock ledger and point accumulator with
//!   the flat key-value persistence contract.
//! - [`progression::Progression`] -- Level/XP counter with a geometric
//!   threshold.
//! - [`overlay::Overlay`] -- Panel state machine that gates gameplay input.
//! - [`player::Player`] -- Position integration and research-granted effects.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventBus`] -- Subscription-based event bus with buffered
//!   delivery.
//! - [`profile::ProfileStore`] -- Key-value persistence collaborator.

pub mod engine;
pub mod event;
pub mod fixed;
pub mod format;
pub mod input;
pub mod overlay;
pub mod player;
pub mod profile;
pub mod progression;
pub mod research;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
