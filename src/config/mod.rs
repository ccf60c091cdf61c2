//! Configuration module for adlens.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, DataSettings, DatabaseSettings, ServerSettings, Settings, SettingsError,
    SettingsResult,
};
