//! The engine: deterministic orchestration of overlay, research,
//! progression, and the player.
//!
//! Frontends drive the engine through [`Engine::advance`] and queued
//! [`InputIntent`]s, and observe it through the event bus plus read-only
//! queries. Each step runs four phases in a fixed order:
//!
//! 1. **intents** -- drain the queue in submission order.
//! 2. **simulate** -- integrate movement from the latched axis (skipped
//!    while the overlay blocks input), then accrue research points.
//! 3. **post** -- pump component events into the bus, mirror overlay
//!    transitions to the attached panel sink, deliver once.
//! 4. **bookkeeping** -- advance the tick and fold state into the hash.
//!
//! Two engines given the same configuration and intent script produce the
//! same state hash at every step.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use crate::input::InputIntent;
use crate::overlay::{Overlay, Panel, PanelSink};
use crate::player::Player;
use crate::profile::{ProfileError, ProfileStore};
use crate::progression::Progression;
use crate::research::{EffectKind, ResearchDef, ResearchError, ResearchId, ResearchLab};
use crate::sim::{AdvanceResult, SimState, SimulationStrategy, StateHash};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Resolved engine configuration. Loaded from data files by the data crate
/// or built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Research catalog, registered in order at construction.
    pub catalog: Vec<ResearchDef>,
    /// Points accrued per engine step.
    pub points_per_tick: Fixed64,
    /// Player move speed, units per second.
    pub move_speed: Fixed64,
    /// XP required for level 2.
    pub base_threshold: Fixed64,
    /// Threshold multiplier per level-up.
    pub growth_factor: Fixed64,
    /// Steps per second of game time. Scales per-step movement.
    pub ticks_per_second: u32,
    pub strategy: SimulationStrategy,
    /// Ring buffer capacity per event kind.
    pub event_capacity: usize,
}

impl GameConfig {
    /// The built-in research catalog.
    pub fn default_catalog() -> Vec<ResearchDef> {
        vec![
            ResearchDef {
                key: "auto_loot".to_string(),
                display_name: "Auto Loot".to_string(),
                description: "Automatically pick up items".to_string(),
                cost: f64_to_fixed64(50.0),
                effect: EffectKind::AutoLoot,
            },
            ResearchDef {
                key: "xp_boost".to_string(),
                display_name: "XP Boost I".to_string(),
                description: "+10% XP gain".to_string(),
                cost: f64_to_fixed64(100.0),
                effect: EffectKind::XpRate {
                    multiplier: f64_to_fixed64(1.1),
                },
            },
            ResearchDef {
                key: "hp_boost".to_string(),
                display_name: "HP Boost I".to_string(),
                description: "+25 Max HP".to_string(),
                cost: f64_to_fixed64(50.0),
                effect: EffectKind::MaxHealth {
                    bonus: f64_to_fixed64(25.0),
                },
            },
        ]
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            catalog: Self::default_catalog(),
            points_per_tick: f64_to_fixed64(0.5),
            move_speed: f64_to_fixed64(5.0),
            base_threshold: f64_to_fixed64(100.0),
            growth_factor: f64_to_fixed64(1.2),
            ticks_per_second: 1,
            strategy: SimulationStrategy::Tick,
            event_capacity: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    overlay: Overlay,
    research: ResearchLab,
    progression: Progression,
    player: Player,

    /// Public so frontends can register listeners and inspect buffers.
    pub event_bus: EventBus,

    /// Intents queued for the next step, applied in submission order.
    intents: VecDeque<InputIntent>,
    /// Latched movement axis. Updated by `Move` intents, applied every
    /// unblocked step.
    move_axis: (Fixed64, Fixed64),

    store: Option<Box<dyn ProfileStore>>,
    panel_sink: Option<Box<dyn PanelSink>>,

    strategy: SimulationStrategy,
    sim: SimState,
    paused: bool,
    last_state_hash: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.sim.tick)
            .field("strategy", &self.strategy)
            .field("paused", &self.paused)
            .field("queued_intents", &self.intents.len())
            .field("last_state_hash", &self.last_state_hash)
            .field("store", &self.store.is_some())
            .field("panel_sink", &self.panel_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine from a resolved configuration. Duplicate research
    /// keys in the catalog abort construction.
    pub fn new(config: GameConfig) -> Result<Self, ResearchError> {
        let mut research = ResearchLab::new(config.points_per_tick);
        for def in config.catalog {
            research.register(def)?;
        }

        let mut engine = Self {
            overlay: Overlay::new(),
            research,
            progression: Progression::new(config.base_threshold, config.growth_factor),
            player: Player::new(config.move_speed, config.ticks_per_second),
            event_bus: EventBus::new(config.event_capacity),
            intents: VecDeque::new(),
            move_axis: (Fixed64::ZERO, Fixed64::ZERO),
            store: None,
            panel_sink: None,
            strategy: config.strategy,
            sim: SimState::new(),
            paused: false,
            last_state_hash: 0,
        };
        engine.last_state_hash = engine.compute_state_hash();
        Ok(engine)
    }

    // ---------- collaborators ----------

    /// Attach a profile store and restore the research profile from it.
    /// Effects of restored unlocks are re-applied to the player.
    pub fn attach_store(&mut self, store: Box<dyn ProfileStore>) {
        self.store = Some(store);
        let tick = self.sim.tick;

        let restored = match self.store.as_deref() {
            Some(store) => self.research.load_profile(store, tick),
            None => Vec::new(),
        };
        for (id, effect) in restored {
            self.player.apply_effect(id, effect, tick);
        }
        self.last_state_hash = self.compute_state_hash();
    }

    /// Attach a panel sink that mirrors overlay visibility changes.
    pub fn attach_panel_sink(&mut self, sink: Box<dyn PanelSink>) {
        self.panel_sink = Some(sink);
    }

    // ---------- driving ----------

    /// Queue an intent for the next step. Intents apply in submission
    /// order. Queued intents survive pause.
    pub fn submit_intent(&mut self, intent: InputIntent) {
        self.intents.push_back(intent);
    }

    /// Advance the simulation by `dt` ticks of wall input.
    ///
    /// Strategy `Tick` runs exactly one step per call regardless of `dt`.
    /// Strategy `Delta` accumulates `dt` and runs one step per elapsed
    /// fixed timestep, so frame cadence never changes outcomes. While
    /// paused this is a no-op.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }

        let mut result = AdvanceResult::default();
        match self.strategy {
            SimulationStrategy::Tick => {
                self.step_internal(&mut result);
            }
            SimulationStrategy::Delta { fixed_timestep } => {
                self.sim.accumulator += dt;
                let step_size = fixed_timestep.max(1);
                while self.sim.accumulator >= step_size {
                    self.sim.accumulator -= step_size;
                    self.step_internal(&mut result);
                }
            }
        }
        result
    }

    /// Run exactly one step, regardless of strategy or accumulator.
    pub fn step(&mut self) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        let mut result = AdvanceResult::default();
        self.step_internal(&mut result);
        result
    }

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        let tick = self.sim.tick;
        result.intents_applied += self.phase_intents(tick);
        self.phase_simulate(tick);
        self.phase_post();
        self.phase_bookkeeping();
        result.steps_run += 1;
    }

    // ---------- phases ----------

    fn phase_intents(&mut self, tick: Ticks) -> u64 {
        let mut applied = 0;
        while let Some(intent) = self.intents.pop_front() {
            self.apply_intent(intent, tick);
            applied += 1;
        }
        applied
    }

    fn apply_intent(&mut self, intent: InputIntent, tick: Ticks) {
        match intent {
            InputIntent::TogglePanel(panel) => self.overlay.toggle(panel, tick),
            InputIntent::Escape => self.overlay.escape(tick),
            InputIntent::Move { x, y } => {
                // Always latch; the blocking gate applies at simulate time.
                self.move_axis = (x, y);
            }
            InputIntent::GainXp { base } => {
                let multiplier = self.player.xp_multiplier();
                self.progression.gain_xp(base, multiplier, tick);
            }
            InputIntent::GrantPoints { amount } => {
                self.research.grant_points(amount, tick);
            }
        }
    }

    fn phase_simulate(&mut self, tick: Ticks) {
        if !self.overlay.should_block_input() {
            let (x, y) = self.move_axis;
            self.player.apply_move(x, y);
        }
        self.research.accrue(tick);
    }

    fn phase_post(&mut self) {
        let overlay_events = self.overlay.drain_events();

        // Mirror visibility to the sink in event order, so close-then-open
        // sequencing survives the trip.
        if let Some(sink) = self.panel_sink.as_deref_mut() {
            for event in &overlay_events {
                match event {
                    Event::PanelOpened { panel, .. } => sink.set_visible(*panel, true),
                    Event::PanelClosed { panel, .. } => sink.set_visible(*panel, false),
                    _ => {}
                }
            }
        }

        for event in overlay_events {
            self.event_bus.emit(event);
        }
        for event in self.research.drain_events() {
            self.event_bus.emit(event);
        }
        for event in self.progression.drain_events() {
            self.event_bus.emit(event);
        }
        for event in self.player.drain_events() {
            self.event_bus.emit(event);
        }

        self.event_bus.deliver();
    }

    fn phase_bookkeeping(&mut self) {
        self.sim.tick += 1;
        self.last_state_hash = self.compute_state_hash();
    }

    // ---------- operations outside the tick ----------

    /// Unlock a research node, as UI button presses do between ticks.
    ///
    /// On success the node's effect applies to the player immediately and
    /// the profile is saved best-effort through the attached store (a
    /// failed flush leaves the session running). Events appear at the next
    /// step's delivery.
    pub fn unlock_research(&mut self, id: ResearchId) -> Result<(), ResearchError> {
        let tick = self.sim.tick;
        self.research.unlock(id, tick)?;

        if let Some(node) = self.research.node(id) {
            let effect = node.effect;
            self.player.apply_effect(id, effect, tick);
        }

        if let Some(store) = self.store.as_deref_mut() {
            let _ = self.research.save_profile(store);
        }

        self.last_state_hash = self.compute_state_hash();
        Ok(())
    }

    /// Save the research profile through the attached store. Without a
    /// store this is a silent skip.
    pub fn save_profile(&mut self) -> Result<(), ProfileError> {
        match self.store.as_deref_mut() {
            Some(store) => self.research.save_profile(store),
            None => Ok(()),
        }
    }

    // ---------- pause & strategy ----------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the stepping strategy. Works while paused.
    pub fn set_strategy(&mut self, strategy: SimulationStrategy) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> SimulationStrategy {
        self.strategy
    }

    // ---------- queries ----------

    pub fn tick(&self) -> Ticks {
        self.sim.tick
    }

    /// Hash of sim-visible state as of the last step (or the last
    /// out-of-tick mutation).
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn research(&self) -> &ResearchLab {
        &self.research
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    // ---------- hashing ----------

    fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim.tick);

        // Overlay: current (index+1, 0 for none) then the open list.
        match self.overlay.current() {
            Some(panel) => hash.write_u32(panel.index() as u32 + 1),
            None => hash.write_u32(0),
        }
        hash.write_u64(self.overlay.open_panels().len() as u64);
        for panel in self.overlay.open_panels() {
            hash.write_u32(panel.index() as u32);
        }

        // Research: balance, then unlocked flags in id order. Never iterate
        // the set itself; its order is not deterministic.
        hash.write_fixed64(self.research.balance());
        for node in self.research.nodes() {
            hash.write_u32(u32::from(self.research.is_unlocked(node.id)));
        }

        // Progression.
        hash.write_u32(self.progression.level());
        hash.write_fixed64(self.progression.xp());
        hash.write_fixed64(self.progression.threshold());

        // Player.
        let pos = self.player.position();
        hash.write_fixed64(pos.x);
        hash.write_fixed64(pos.y);
        hash.write_fixed64(self.player.xp_multiplier());
        hash.write_u32(u32::from(self.player.auto_loot()));
        hash.write_fixed64(self.player.max_health_bonus());

        hash.finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
