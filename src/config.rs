//! Configuration for the model index.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.modelindex/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MI_` and use double underscores
//! to separate nested levels:
//! - `MI_INDEX__PARALLEL_THREADS=8` sets `index.parallel_threads`
//! - `MI_INDEX__RUNTIME_ID__PROPERTY=id` sets `index.runtime_id.property`
//! - `MI_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::index::{BuildOptions, PropertyKey, UnqualifiedNameKey};
use crate::types::ObjectType;

/// Directory holding the settings file, searched upwards from the current
/// directory.
pub const CONFIG_DIR: &str = ".modelindex";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// Threads in the rebuild pool; 0 uses one per CPU
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Rebuilds with fewer files than this stay on the calling thread
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    #[serde(default = "default_runtime_id")]
    pub runtime_id: KeyRuleConfig,

    #[serde(default)]
    pub unqualified_name: NameRuleConfig,

    #[serde(default = "default_table_usage")]
    pub table_usage: KeyRuleConfig,
}

/// Index keyed by a property of the file content.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KeyRuleConfig {
    pub object_type: ObjectType,
    pub property: String,
}

/// Index keyed by the unqualified name.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NameRuleConfig {
    #[serde(default = "default_name_object_type")]
    pub object_type: ObjectType,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `modelindex::updater = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_parallel_threshold() -> usize {
    64
}
fn default_name_object_type() -> ObjectType {
    ObjectType::ProductComponent
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_runtime_id() -> KeyRuleConfig {
    KeyRuleConfig {
        object_type: ObjectType::ProductComponent,
        property: "runtimeId".to_string(),
    }
}
fn default_table_usage() -> KeyRuleConfig {
    KeyRuleConfig {
        object_type: ObjectType::TableContents,
        property: "tableStructure".to_string(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index: IndexConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            parallel_threshold: default_parallel_threshold(),
            runtime_id: default_runtime_id(),
            unqualified_name: NameRuleConfig::default(),
            table_usage: default_table_usage(),
        }
    }
}

impl Default for NameRuleConfig {
    fn default() -> Self {
        Self {
            object_type: default_name_object_type(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl IndexConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::from_config(self)
    }

    pub fn runtime_id_key(&self) -> PropertyKey {
        PropertyKey::new(
            "runtime-id",
            self.runtime_id.object_type,
            &self.runtime_id.property,
        )
    }

    pub fn unqualified_name_key(&self) -> UnqualifiedNameKey {
        UnqualifiedNameKey::new(self.unqualified_name.object_type)
    }

    pub fn table_usage_key(&self) -> PropertyKey {
        PropertyKey::new(
            "table-usage",
            self.table_usage.object_type,
            &self.table_usage.property,
        )
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still applying env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting levels, single underscores
            // stay inside field names
            .merge(Env::prefixed("MI_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
