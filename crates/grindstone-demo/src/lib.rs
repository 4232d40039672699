//! Demo composition layer for the Grindstone engine.
//!
//! Loads game data into an engine [`Session`], decodes key presses into
//! input intents, and persists progress through a JSON profile.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! use grindstone_demo::{JsonProfile, build_session};
//!
//! let store = Box::new(JsonProfile::open(Path::new("profile.json")));
//! let mut session = build_session(Path::new("data"), store)?;
//! session.tick_n(10);
//! println!("{}", session.hud_line());
//! ```

pub mod error;
pub mod keymap;
pub mod profile;
pub mod session;

pub use error::DemoError;
pub use keymap::{Key, KeyAction, MoveKeys, action_for_key};
pub use profile::JsonProfile;
pub use session::{Session, build_session};
