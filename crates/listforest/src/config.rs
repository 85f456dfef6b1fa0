//! # Configuration
//!
//! Configuration is managed by [`confique`], which handles layered loading from
//! TOML files and environment variables.
//!
//! ## Storage Hierarchy
//!
//! Values are resolved in priority order:
//! 1. **Environment variables**: `LISTFOREST_API_ROOT`, `LISTFOREST_PAGE_SIZE`, etc.
//! 2. **Explicit file**: the path handed to [`ForestConfig::load`], if any.
//! 3. **Global Config**: `listforest.toml` in the OS-appropriate config directory
//!    (via the `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! Missing files are skipped.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `api_root` | `/api/v1/content/` | Prefix of every endpoint |
//! | `page_size` | `10` | Lists per page in paginated views |
//! | `usage_warning_threshold` | `1` | Warn before editing a reusable item used by more owners than this |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ForestError, Result};

pub const CONFIG_FILE_NAME: &str = "listforest.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ForestConfig {
    /// Prefix of every API endpoint.
    #[config(default = "/api/v1/content/", env = "LISTFOREST_API_ROOT")]
    pub api_root: String,

    /// Lists per page in paginated views.
    #[config(default = 10, env = "LISTFOREST_PAGE_SIZE")]
    pub page_size: usize,

    /// Editing a reusable item referenced by more distinct owners than this
    /// asks for confirmation first.
    #[config(default = 1, env = "LISTFOREST_USAGE_WARNING_THRESHOLD")]
    pub usage_warning_threshold: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            api_root: "/api/v1/content/".to_string(),
            page_size: 10,
            usage_warning_threshold: 1,
        }
    }
}

impl ForestConfig {
    /// Loads the layered configuration, `explicit` taking precedence over the
    /// global file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = explicit {
            builder = builder.file(path);
        }
        if let Some(global) = global_config_path() {
            builder = builder.file(global);
        }
        let config = builder
            .load()
            .map_err(|e| ForestError::Config(e.to_string()))?;
        config.validate()?;
        tracing::debug!(api_root = %config.api_root, page_size = config.page_size, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ForestError::Config("page_size must be at least 1".to_string()));
        }
        if self.api_root.trim().is_empty() {
            return Err(ForestError::Config("api_root must not be empty".to_string()));
        }
        Ok(())
    }

    /// A commented sample `listforest.toml`.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "listforest")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
