//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bomforest/bomforest.toml`
//! 3. Explicit config file given with `--config`
//! 4. Environment variables: `BOMFOREST_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::MAX_QUANTITY;

/// Unified configuration for bomforest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Ceiling for any occurrence quantity, at most 1000
    pub max_quantity: u32,
    /// Colored error output
    pub color: bool,
    /// Word that ends an interactive session
    pub quit_command: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_quantity: MAX_QUANTITY,
            color: true,
            quit_command: "quit".into(),
        }
    }
}

/// Get the XDG config directory for bomforest.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bomforest").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bomforest.toml"))
}

impl Settings {
    /// Load settings from all layers.
    pub fn load(explicit: Option<&Path>) -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref(), explicit)
    }

    /// Load settings with an explicit global config location.
    ///
    /// A missing global file is skipped, a missing explicit file is an error.
    #[instrument(level = "debug")]
    pub fn load_from(global: Option<&Path>, explicit: Option<&Path>) -> ApplicationResult<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("max_quantity", i64::from(defaults.max_quantity))
            .map_err(config_err)?
            .set_default("color", defaults.color)
            .map_err(config_err)?
            .set_default("quit_command", defaults.quit_command)
            .map_err(config_err)?;

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }
        if let Some(path) = explicit {
            debug!("explicit config: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("BOMFOREST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the registry or the shell cannot work with.
    pub fn validate(&self) -> ApplicationResult<()> {
        if !(1..=MAX_QUANTITY).contains(&self.max_quantity) {
            return Err(ApplicationError::Config {
                message: format!(
                    "max_quantity must lie in 1..={}, got {}",
                    MAX_QUANTITY, self.max_quantity
                ),
            });
        }
        if self.quit_command.is_empty() || self.quit_command.contains(char::is_whitespace) {
            return Err(ApplicationError::Config {
                message: format!("quit_command must be a single word, got {:?}", self.quit_command),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bomforest configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bomforest/bomforest.toml
#   File:   bomforest --config <FILE>
#   Env:    BOMFOREST_* environment variables (e.g. BOMFOREST_MAX_QUANTITY=500)

# Largest quantity a part or assembly may occur with (1..=1000)
# max_quantity = 1000

# Colored error messages (NO_COLOR is honoured as well)
# color = true

# Word that ends an interactive session
# quit_command = "quit"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
