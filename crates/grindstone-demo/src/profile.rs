//! File-backed profile store.
//!
//! Persists the balance and unlock flags as a single JSON document. A
//! missing or corrupt file degrades to an empty profile, so a fresh
//! install and a damaged save both start from defaults instead of
//! failing the session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use grindstone_core::profile::{ProfileError, ProfileStore};
use serde::{Deserialize, Serialize};

/// On-disk document. BTreeMaps keep the serialized key order stable, so
/// saves diff cleanly.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileData {
    #[serde(default)]
    floats: BTreeMap<String, f64>,
    #[serde(default)]
    ints: BTreeMap<String, i64>,
}

/// Profile store persisted as a JSON file.
#[derive(Debug)]
pub struct JsonProfile {
    path: PathBuf,
    data: ProfileData,
}

impl JsonProfile {
    /// Open a profile file, reading existing contents if present.
    pub fn open(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    log::info!("loaded profile from {}", path.display());
                    data
                }
                Err(e) => {
                    log::warn!(
                        "profile at {} is corrupt, starting fresh: {e}",
                        path.display()
                    );
                    ProfileData::default()
                }
            },
            Err(_) => {
                log::info!("no profile at {}, starting fresh", path.display());
                ProfileData::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            data,
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for JsonProfile {
    fn set_f64(&mut self, key: &str, value: f64) {
        self.data.floats.insert(key.to_string(), value);
    }

    fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.data.floats.get(key).copied().unwrap_or(default)
    }

    fn set_i64(&mut self, key: &str, value: i64) {
        self.data.ints.insert(key.to_string(), value);
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.data.ints.get(key).copied().unwrap_or(default)
    }

    fn flush(&mut self) -> Result<(), ProfileError> {
        let json =
            serde_json::to_string_pretty(&self.data).map_err(|e| ProfileError::Serialization {
                detail: e.to_string(),
            })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
