//! Assembles an engine [`GameConfig`] from a data directory.
//!
//! The `research` file is required; `tuning` is optional and falls back to
//! built-in defaults. All numeric values are validated here before
//! conversion to fixed-point, so a bad data file fails at load time with a
//! field-level error instead of panicking mid-simulation.

use crate::loader::{self, DataLoadError};
use crate::schema::{EffectData, ResearchNodeData, TuningData};
use grindstone_core::engine::GameConfig;
use grindstone_core::fixed::{Fixed64, f64_to_fixed64};
use grindstone_core::research::{EffectKind, ResearchDef};
use std::collections::HashMap;
use std::path::Path;

// ===========================================================================
// Loading
// ===========================================================================

/// Load a complete game configuration from a data directory.
///
/// Reads `research.{ron,toml,json}` (required) and `tuning.{ron,toml,json}`
/// (optional). Simulation strategy and event capacity are not data-driven
/// and keep their [`GameConfig::default`] values.
pub fn load_game_config(dir: &Path) -> Result<GameConfig, DataLoadError> {
    let research_path = loader::require_data_file(dir, "research")?;
    let nodes: Vec<ResearchNodeData> = loader::deserialize_list(&research_path, "research")?;

    let mut key_index: HashMap<String, usize> = HashMap::new();
    let mut catalog = Vec::with_capacity(nodes.len());
    for node in nodes {
        loader::check_duplicate(&key_index, &node.key, &research_path)?;
        key_index.insert(node.key.clone(), catalog.len());
        catalog.push(build_def(node, &research_path)?);
    }

    let tuning = match loader::find_data_file(dir, "tuning")? {
        Some(path) => {
            let data: TuningData = loader::deserialize_file(&path)?;
            resolve_tuning(data, &path)?
        }
        None => resolve_defaults(),
    };

    Ok(GameConfig {
        catalog,
        points_per_tick: tuning.points_per_tick,
        move_speed: tuning.move_speed,
        base_threshold: tuning.base_threshold,
        growth_factor: tuning.growth_factor,
        ticks_per_second: tuning.ticks_per_second,
        ..GameConfig::default()
    })
}

// ===========================================================================
// Research assembly
// ===========================================================================

fn build_def(node: ResearchNodeData, file: &Path) -> Result<ResearchDef, DataLoadError> {
    if node.cost > i32::MAX as u32 {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            field: "cost",
            detail: format!("{} exceeds the representable range", node.cost),
        });
    }

    // An omitted display name falls back to the key so UI rows are never
    // blank.
    let display_name = if node.display_name.is_empty() {
        node.key.clone()
    } else {
        node.display_name
    };

    Ok(ResearchDef {
        key: node.key,
        display_name,
        description: node.description,
        cost: f64_to_fixed64(f64::from(node.cost)),
        effect: resolve_effect(node.effect, file)?,
    })
}

fn resolve_effect(effect: EffectData, file: &Path) -> Result<EffectKind, DataLoadError> {
    match effect {
        EffectData::AutoLoot => Ok(EffectKind::AutoLoot),
        EffectData::XpRate { multiplier } => {
            if !multiplier.is_finite() || multiplier <= 0.0 || multiplier > i32::MAX as f64 {
                return Err(DataLoadError::InvalidValue {
                    file: file.to_path_buf(),
                    field: "multiplier",
                    detail: format!("{multiplier} must be a positive finite number"),
                });
            }
            Ok(EffectKind::XpRate {
                multiplier: f64_to_fixed64(multiplier),
            })
        }
        EffectData::MaxHealth { bonus } => {
            if !bonus.is_finite() || bonus < 0.0 || bonus > i32::MAX as f64 {
                return Err(DataLoadError::InvalidValue {
                    file: file.to_path_buf(),
                    field: "bonus",
                    detail: format!("{bonus} must be a non-negative finite number"),
                });
            }
            Ok(EffectKind::MaxHealth {
                bonus: f64_to_fixed64(bonus),
            })
        }
    }
}

// ===========================================================================
// Tuning assembly
// ===========================================================================

struct ResolvedTuning {
    points_per_tick: Fixed64,
    move_speed: Fixed64,
    base_threshold: Fixed64,
    growth_factor: Fixed64,
    ticks_per_second: u32,
}

fn resolve_tuning(data: TuningData, file: &Path) -> Result<ResolvedTuning, DataLoadError> {
    let points_per_tick = resolve_fixed(data.points_per_tick, "points_per_tick", file)?;
    let move_speed = resolve_fixed(data.move_speed, "move_speed", file)?;

    let base_threshold = resolve_fixed(data.base_threshold, "base_threshold", file)?;
    if base_threshold <= Fixed64::ZERO {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            field: "base_threshold",
            detail: "must be positive".to_string(),
        });
    }

    let growth_factor = resolve_fixed(data.growth_factor, "growth_factor", file)?;
    if growth_factor < Fixed64::ONE {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            field: "growth_factor",
            detail: "must be at least 1".to_string(),
        });
    }

    if data.ticks_per_second == 0 {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            field: "ticks_per_second",
            detail: "must be at least 1".to_string(),
        });
    }

    Ok(ResolvedTuning {
        points_per_tick,
        move_speed,
        base_threshold,
        growth_factor,
        ticks_per_second: data.ticks_per_second,
    })
}

/// Built-in tuning, used when no tuning file is present. Known-valid, so it
/// skips the range checks.
fn resolve_defaults() -> ResolvedTuning {
    let defaults = TuningData::default();
    ResolvedTuning {
        points_per_tick: f64_to_fixed64(defaults.points_per_tick),
        move_speed: f64_to_fixed64(defaults.move_speed),
        base_threshold: f64_to_fixed64(defaults.base_threshold),
        growth_factor: f64_to_fixed64(defaults.growth_factor),
        ticks_per_second: defaults.ticks_per_second,
    }
}

fn resolve_fixed(value: f64, field: &'static str, file: &Path) -> Result<Fixed64, DataLoadError> {
    if !value.is_finite() || value < 0.0 || value > i32::MAX as f64 {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            field,
            detail: format!("{value} is outside the representable range"),
        });
    }
    Ok(f64_to_fixed64(value))
}

// ===========================================================================
// Tests
// ===========================================================================
