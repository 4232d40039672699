//! Key-value profile store, the persistence collaborator.
//!
//! The contract is a flat string-keyed map of floats and ints with an
//! explicit [`flush`](ProfileStore::flush). Research persistence writes
//! through it; everything else about storage (file format, location,
//! platform) is the implementor's business.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile serialization failed: {detail}")]
    Serialization { detail: String },
}

/// Flat key-value persistence.
///
/// Sets mutate an in-memory view; nothing is durable until `flush`.
/// Gets return the caller's default when the key is absent.
pub trait ProfileStore {
    fn set_f64(&mut self, key: &str, value: f64);
    fn get_f64(&self, key: &str, default: f64) -> f64;

    fn set_i64(&mut self, key: &str, value: i64);
    fn get_i64(&self, key: &str, default: i64) -> i64;

    /// Make pending writes durable.
    fn flush(&mut self) -> Result<(), ProfileError>;
}

/// In-memory store for tests and ephemeral sessions. `flush` is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfile {
    floats: HashMap<String, f64>,
    ints: HashMap<String, i64>,
}

impl MemoryProfile {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfile {
    fn set_f64(&mut self, key: &str, value: f64) {
        self.floats.insert(key.to_string(), value);
    }

    fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.floats.get(key).copied().unwrap_or(default)
    }

    fn set_i64(&mut self, key: &str, value: i64) {
        self.ints.insert(key.to_string(), value);
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    fn flush(&mut self) -> Result<(), ProfileError> {
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
