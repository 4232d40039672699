use std::path::PathBuf;

/// Errors that can occur while composing or driving a demo session.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Failed to load game data from the data directory.
    #[error("data load error in {dir}: {source}")]
    DataLoad {
        dir: PathBuf,
        source: grindstone_data::DataLoadError,
    },

    /// A research key requested by name does not exist in the catalog.
    #[error("research '{key}' not found in catalog")]
    ResearchNotFound { key: String },

    /// A research operation failed.
    #[error(transparent)]
    Research(#[from] grindstone_core::research::ResearchError),

    /// Profile persistence failed.
    #[error(transparent)]
    Profile(#[from] grindstone_core::profile::ProfileError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
