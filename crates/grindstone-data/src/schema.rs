//! Serde schema for on-disk game definitions.
//!
//! These structs mirror the data files, not the runtime types: numbers are
//! plain integers and floats, optional fields carry defaults, and effects
//! use externally tagged snake_case variants. Resolution into
//! [`grindstone_core::engine::GameConfig`] happens in [`crate::game_config`].

use serde::{Deserialize, Serialize};

// ===========================================================================
// Research catalog
// ===========================================================================

/// One research node as written in `research.{ron,json,toml}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNodeData {
    /// Unique key. Doubles as the display name when none is given.
    pub key: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Unlock cost in whole points.
    pub cost: u32,

    pub effect: EffectData,
}

/// Effect tag as written in data files.
///
/// RON: `auto_loot`, `xp_rate(multiplier: 1.1)`.
/// JSON: `"auto_loot"`, `{"xp_rate": {"multiplier": 1.1}}`.
/// TOML: `"auto_loot"`, `{ xp_rate = { multiplier = 1.1 } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectData {
    AutoLoot,
    XpRate { multiplier: f64 },
    MaxHealth { bonus: f64 },
}

/// Top-level wrapper for TOML research files (`[[research]]` tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlResearch {
    pub research: Vec<ResearchNodeData>,
}

// ===========================================================================
// Tuning
// ===========================================================================

fn default_points_per_tick() -> f64 {
    0.5
}

fn default_move_speed() -> f64 {
    5.0
}

fn default_base_threshold() -> f64 {
    100.0
}

fn default_growth_factor() -> f64 {
    1.2
}

fn default_ticks_per_second() -> u32 {
    1
}

/// Tuning values from `tuning.{ron,json,toml}`. Every field is optional;
/// a missing file means all defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningData {
    #[serde(default = "default_points_per_tick")]
    pub points_per_tick: f64,

    #[serde(default = "default_move_speed")]
    pub move_speed: f64,

    #[serde(default = "default_base_threshold")]
    pub base_threshold: f64,

    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,

    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
}

impl Default for TuningData {
    fn default() -> Self {
        Self {
            points_per_tick: default_points_per_tick(),
            move_speed: default_move_speed(),
            base_threshold: default_base_threshold(),
            growth_factor: default_growth_factor(),
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
