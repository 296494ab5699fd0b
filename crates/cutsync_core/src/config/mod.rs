//! Reconciliation settings.
//!
//! [`Settings`] groups the options into `[cut]`, `[shots]`, `[versions]` and
//! `[logging]` tables. [`ConfigManager`] keeps them in a TOML file.
//!
//! # Example
//!
//! ```no_run
//! use cutsync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/cutsync.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Head in: {}", config.settings().cut.default_head_in);
//!
//! config.settings_mut().shots.use_clip_names_for_shot_names = true;
//! config.update_section(ConfigSection::Shots).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, CutSettings, LoggingSettings, RelativeMapping, Settings, ShotSettings,
    VersionSettings,
};
