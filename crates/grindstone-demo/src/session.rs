//! Session composition: wires a data directory, a profile store, and log
//! listeners into a running engine.

use std::path::Path;

use grindstone_core::engine::{Engine, GameConfig};
use grindstone_core::event::{Event, EventKind};
use grindstone_core::fixed::{Ticks, fixed64_to_f64};
use grindstone_core::format::format_points;
use grindstone_core::input::InputIntent;
use grindstone_core::profile::ProfileStore;
use grindstone_core::research::Availability;
use grindstone_core::sim::AdvanceResult;
use grindstone_data::load_game_config;

use crate::error::DemoError;
use crate::keymap::KeyAction;

/// An interactive game session: one engine with log listeners installed
/// and a profile store attached.
pub struct Session {
    engine: Engine,
}

/// Load game data from `data_dir` and build a session around it.
///
/// The store is attached after listeners, so restored-progress events are
/// logged like live ones.
pub fn build_session(
    data_dir: &Path,
    store: Box<dyn ProfileStore>,
) -> Result<Session, DemoError> {
    let config = load_game_config(data_dir).map_err(|e| DemoError::DataLoad {
        dir: data_dir.to_path_buf(),
        source: e,
    })?;
    Session::from_config(config, store)
}

impl Session {
    /// Build a session from an already-resolved configuration.
    pub fn from_config(
        config: GameConfig,
        store: Box<dyn ProfileStore>,
    ) -> Result<Self, DemoError> {
        let mut engine = Engine::new(config)?;
        install_log_listeners(&mut engine);
        engine.attach_store(store);
        Ok(Self { engine })
    }

    /// Advance the simulation by one step.
    pub fn tick(&mut self) -> AdvanceResult {
        self.engine.step()
    }

    /// Advance the simulation by `n` steps.
    pub fn tick_n(&mut self, n: u64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        for _ in 0..n {
            let step = self.engine.step();
            result.steps_run += step.steps_run;
            result.intents_applied += step.intents_applied;
        }
        result
    }

    /// Advance by `dt` elapsed ticks under the configured strategy.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        self.engine.advance(dt)
    }

    /// Queue an intent for the next step.
    pub fn submit(&mut self, intent: InputIntent) {
        self.engine.submit_intent(intent);
    }

    /// Apply a decoded key action.
    pub fn apply_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Intent(intent) => self.engine.submit_intent(intent),
            KeyAction::ProbeAutoLoot => {
                let state = if self.auto_loot_enabled() { "ON" } else { "OFF" };
                log::info!("auto loot: {state}");
            }
        }
    }

    /// Unlock a research node by key. Spends points, applies the effect,
    /// and saves the profile.
    pub fn unlock(&mut self, key: &str) -> Result<(), DemoError> {
        let id = self
            .engine
            .research()
            .find(key)
            .ok_or_else(|| DemoError::ResearchNotFound {
                key: key.to_string(),
            })?;
        self.engine.unlock_research(id)?;
        Ok(())
    }

    /// Persist the profile now.
    pub fn save(&mut self) -> Result<(), DemoError> {
        self.engine.save_profile()?;
        Ok(())
    }

    /// One-line HUD summary of the research balance.
    pub fn hud_line(&self) -> String {
        let balance = fixed64_to_f64(self.engine.research().balance());
        format!("Research Points: {}", format_points(balance))
    }

    /// One display row per research node, in registration order.
    pub fn research_rows(&self) -> Vec<String> {
        let lab = self.engine.research();
        let mut rows = Vec::with_capacity(lab.nodes().len());
        for node in lab.nodes() {
            let Some(availability) = lab.availability(node.id) else {
                continue;
            };
            let row = match availability {
                Availability::Unlocked => {
                    format!("[unlocked] {} - {}", node.display_name, node.description)
                }
                Availability::Affordable => format!(
                    "[cost {}] {} - {}",
                    format_points(fixed64_to_f64(node.cost)),
                    node.display_name,
                    node.description
                ),
                Availability::Locked { missing } => format!(
                    "[cost {}, need {} more] {} - {}",
                    format_points(fixed64_to_f64(node.cost)),
                    format_points(fixed64_to_f64(missing)),
                    node.display_name,
                    node.description
                ),
            };
            rows.push(row);
        }
        rows
    }

    /// Current engine tick.
    pub fn current_tick(&self) -> Ticks {
        self.engine.tick()
    }

    /// Deterministic state hash, for replay comparison.
    pub fn state_hash(&self) -> u64 {
        self.engine.state_hash()
    }

    /// Whether auto loot is active on the player.
    pub fn auto_loot_enabled(&self) -> bool {
        self.engine.player().auto_loot()
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access, for frontends that drive the engine directly.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

/// Register one logging listener per event kind. Routine per-tick events
/// log at trace, progress milestones at info.
fn install_log_listeners(engine: &mut Engine) {
    for kind in EventKind::ALL {
        engine.event_bus.on(kind, Box::new(log_event));
    }
}

fn log_event(event: &Event) {
    match event {
        Event::PanelOpened { panel, tick } => {
            log::debug!("[tick {tick}] panel opened: {panel:?}");
        }
        Event::PanelClosed { panel, tick } => {
            log::debug!("[tick {tick}] panel closed: {panel:?}");
        }
        Event::PointsChanged { balance, tick } => {
            log::trace!("[tick {tick}] balance: {}", fixed64_to_f64(*balance));
        }
        Event::NodeUnlocked { key, tick, .. } => {
            log::info!("[tick {tick}] research unlocked: {key}");
        }
        Event::XpGained {
            amount,
            total,
            tick,
        } => {
            log::debug!(
                "[tick {tick}] xp +{} (total {})",
                fixed64_to_f64(*amount),
                fixed64_to_f64(*total)
            );
        }
        Event::LevelUp { level, tick, .. } => {
            log::info!("[tick {tick}] level up: {level}");
        }
        Event::EffectApplied { effect, tick, .. } => {
            log::info!("[tick {tick}] effect applied: {effect:?}");
        }
    }
}
