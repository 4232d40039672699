//! Shared fixtures for unit tests, integration tests, and benchmarks.
//!
//! Compiled into the crate under `cfg(test)`, and exported to dependents
//! through the `test-utils` feature.

use crate::engine::{Engine, GameConfig};
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::research::ResearchDef;

/// Shorthand for fixed-point literals in tests.
pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

/// The built-in catalog: auto_loot (50), xp_boost (100), hp_boost (50).
pub fn default_defs() -> Vec<ResearchDef> {
    GameConfig::default_catalog()
}

pub fn auto_loot_def() -> ResearchDef {
    default_defs().swap_remove(0)
}

pub fn xp_boost_def() -> ResearchDef {
    default_defs().swap_remove(1)
}

pub fn hp_boost_def() -> ResearchDef {
    default_defs().swap_remove(2)
}

/// Default config with the accrual rate overridden.
pub fn test_config(points_per_tick: f64) -> GameConfig {
    GameConfig {
        points_per_tick: fixed(points_per_tick),
        ..GameConfig::default()
    }
}

/// Engine over [`test_config`]. Tick strategy, built-in catalog, no store.
pub fn test_engine(points_per_tick: f64) -> Engine {
    Engine::new(test_config(points_per_tick)).expect("default catalog has unique keys")
}
