// SPDX-License-Identifier: GPL-3.0-only
//! Runtime configuration for the `devwatch` binary
//!
//! Read from `$XDG_CONFIG_HOME/devwatch/config.json`. Every field has a
//! default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_DIR: &str = "devwatch";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Also log to the systemd journal when it is reachable
    pub journald: bool,
    /// Print the device snapshot before subscribing
    pub list_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            journald: true,
            list_on_startup: true,
        }
    }
}

fn default_log_filter() -> String {
    format!("warn,{}=info", env!("CARGO_CRATE_NAME"))
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        Self::from_json(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}
