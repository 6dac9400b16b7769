//! Configuration schema for setup-coursier
//!
//! Configuration is stored at `~/.config/setup-coursier/config.toml`

use crate::platform::{DEFAULT_BASE_URL, DEFAULT_VERSION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coursier release settings
    pub coursier: CoursierConfig,

    /// Tool cache settings
    pub cache: CacheConfig,
}

/// Coursier release settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursierConfig {
    /// Release installed when no version input is given
    pub version: String,

    /// Base URL of the release downloads, for mirrors
    pub base_url: String,
}

impl Default for CoursierConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Tool cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Tool cache root (default: `RUNNER_TOOL_CACHE` or the user cache dir)
    pub root: Option<PathBuf>,

    /// Scratch directory for downloads (default: `RUNNER_TEMP` or the system temp dir)
    pub temp_dir: Option<PathBuf>,
}
