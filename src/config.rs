//! Persisted application settings.
//!
//! A small JSON file under the platform config directory. Loading is
//! tolerant: a missing or unparsable file yields defaults instead of an
//! error, so a corrupt config never blocks startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::SidecarFormat;
use crate::video::DEFAULT_FRAME_RATE;

const CONFIG_DIR: &str = "quicklabel";
const CONFIG_FILE: &str = "config.json";

/// Bumped when a release changes the schema incompatibly.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no platform config directory available")]
    NoConfigDir,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    /// Last image directory the user browsed.
    pub image_dir: Option<PathBuf>,
    /// Last sidecar save directory.
    pub save_dir: Option<PathBuf>,
    pub annotation_format: SidecarFormat,
    pub video_frame_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            image_dir: None,
            save_dir: None,
            annotation_format: SidecarFormat::default(),
            video_frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl AppConfig {
    /// The per-user config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("config location unavailable: {}", e);
                Self::default()
            }
        }
    }

    /// Load from `path`. Missing or broken files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("cannot read config {:?}: {}", path, e);
                }
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("cannot parse config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}
