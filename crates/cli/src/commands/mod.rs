pub mod caption;
pub mod compose;
pub mod doctor;
pub mod onboard;
pub mod serve;

use reelprompt_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load `--config` if given, else the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}
