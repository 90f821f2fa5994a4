// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling

use crate::constants::{DEFAULT_CARD_LABEL, DEVICE_DIR};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Virtual camera settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Card label other applications see for the loopback device; also
    /// passed to the module load command
    pub card_label: String,
    /// Directory scanned for candidate device nodes
    pub device_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            card_label: DEFAULT_CARD_LABEL.to_string(),
            device_dir: PathBuf::from(DEVICE_DIR),
        }
    }
}

impl Config {
    /// Location of the persisted configuration file.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("virtual-camera").join("config.json"))
    }

    /// Load the persisted configuration, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration as JSON.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, contents)
    }
}
