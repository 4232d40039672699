//! Stepping strategy, tick bookkeeping, and the desync hash.
//!
//! The engine is parameterized by a [`SimulationStrategy`] that decides how
//! many steps one `advance()` call runs. The step itself is identical under
//! both strategies.

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Simulation strategy
// ---------------------------------------------------------------------------

/// How elapsed input time maps onto simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SimulationStrategy {
    /// One step per `advance()` call, whatever `dt` says. For hosts that
    /// call at a fixed cadence themselves.
    Tick,

    /// Real-time hosts pass elapsed `dt`; the engine banks it and runs one
    /// step per full `fixed_timestep`, carrying the remainder. Frame cadence
    /// therefore never changes outcomes.
    Delta {
        /// Ticks of input time per simulation step.
        fixed_timestep: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Step bookkeeping the engine mutates as it runs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Ticks completed. One increment per step.
    pub tick: Ticks,

    /// Banked input time under the delta strategy; always below
    /// `fixed_timestep` between `advance()` calls. Stays 0 in tick mode.
    pub accumulator: Ticks,
}

impl SimState {
    /// Tick 0, nothing banked.
    pub fn new() -> Self {
        Self {
            tick: 0,
            accumulator: 0,
        }
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// What an `Engine::advance()` call actually did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Steps executed. 0 while paused or while the accumulator is short.
    pub steps_run: u64,

    /// Queued intents applied during those steps.
    pub intents_applied: u64,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Order-sensitive 64-bit FNV-1a over sim-visible state, for comparing two
/// runs. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Hashes the raw Q32.32 bits, so equal values always hash equal.
    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
