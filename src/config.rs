//! Configuration module for gofacts.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `GOFACTS_` and use double
//! underscores to separate nested levels:
//! - `GOFACTS_TAGS__PRECEDENCE=last_match` sets `tags.precedence`
//! - `GOFACTS_REPORT__MAX_PROMOTION_DEPTH=2` sets `report.max_promotion_depth`
//! - `GOFACTS_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tag::KeyPrecedence;

/// Directory holding the settings file
pub const CONFIG_DIR: &str = ".gofacts";

const ENV_PREFIX: &str = "GOFACTS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct TagsConfig {
    /// Tag keys to report; empty reports every key found
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Which pair wins when a tag repeats a key
    #[serde(default)]
    pub precedence: KeyPrecedence,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// Report types and structs declared inside function bodies
    #[serde(default = "default_true")]
    pub include_local_types: bool,

    /// How many levels of embedded structs to expand for promoted fields
    #[serde(default = "default_max_promotion_depth")]
    pub max_promotion_depth: usize,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_max_promotion_depth() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            logging: LoggingConfig::default(),
            tags: TagsConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_local_types: true,
            max_promotion_depth: default_max_promotion_depth(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .gofacts directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::figment(config_path, ENV_PREFIX)
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf(), ENV_PREFIX)
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf, env_prefix: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(env_prefix).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.gofacts/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join("settings.toml"))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Render the settings as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Create a default settings file with helpful comments in `dir`
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        Ok(config_path)
    }
}

const CONFIG_TEMPLATE: &str = r#"# gofacts configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[logging]
# Default log filter; RUST_LOG takes precedence when set
level = "warn"

[tags]
# Tag keys to report, e.g. ["json", "xml"]. Empty reports every key.
namespaces = []

# Which pair wins when a tag repeats a key: "first_match" or "last_match"
precedence = "first_match"

[report]
# Include types and structs declared inside function bodies
include_local_types = true

# Levels of embedded structs expanded when listing promoted fields
max_promotion_depth = 8
"#;
