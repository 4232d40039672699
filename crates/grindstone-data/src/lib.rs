pub mod game_config;
pub mod loader;
pub mod schema;

pub use game_config::load_game_config;
pub use loader::DataLoadError;
