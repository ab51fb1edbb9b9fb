//! # farmmate-settings
//!
//! Layered configuration for the FarmMate gateway.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`FarmmateSettings::default()`]
//! 2. **Settings file**: `~/.farmmate/settings.json` or an explicit path,
//!    deep-merged over defaults
//! 3. **Environment variables**: `FARMMATE_*` and `PYTHON_SERVER_URL`
//!
//! ```no_run
//! let settings = farmmate_settings::load_settings().unwrap_or_default();
//! println!("listening on {}", settings.server.bind_addr());
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    load_with, settings_path, validate,
};
pub use types::*;
