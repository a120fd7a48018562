//! Persisted application settings.
//!
//! Loaded once at startup and rewritten wholesale by the engine after every
//! mutating operation. A missing file yields [`Config::default`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwapError};

pub const SWAPPER_DIR: &str = "Elden Ring Save Swapper";
pub const SAVES_DIR: &str = "Saves";
pub const TIMESTAMPED_DIR: &str = "Timestamped Backups";
pub const DEFAULT_SLOT: &str = "Default_Save";
pub const CONFIG_FILE_NAME: &str = "elden_ring_save_swapper_config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub save_location: String,
    pub backup_location: String,
    pub timestamp_backup_location: String,
    pub swap_directory: String,
    pub setup_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_save: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read(path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| SwapError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SwapError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SwapError::Config(e.to_string()))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json).map_err(|e| SwapError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Point at the game's save directory; the archive root is derived from it.
    pub fn set_save_location(&mut self, dir: &Path) {
        self.save_location = dir.to_string_lossy().into_owned();
        self.swap_directory = archive_root_for(dir).to_string_lossy().into_owned();
    }

    pub fn set_backup_location(&mut self, dir: &Path) {
        self.backup_location = dir.to_string_lossy().into_owned();
        self.timestamp_backup_location = dir.join(TIMESTAMPED_DIR).to_string_lossy().into_owned();
    }

    pub fn current_slot(&self) -> &str { self.last_used_save.as_deref().unwrap_or(DEFAULT_SLOT) }

    pub fn save_dir(&self) -> Result<PathBuf> { existing_dir(&self.save_location, "save location") }

    pub fn backup_dir(&self) -> Result<PathBuf> { existing_dir(&self.backup_location, "backup location") }

    pub fn timestamp_backup_dir(&self) -> Result<PathBuf> {
        set_path(&self.timestamp_backup_location, "timestamped backup location")
    }

    pub fn archive_root(&self) -> Result<PathBuf> { set_path(&self.swap_directory, "swap directory") }
}

pub fn archive_root_for(save_dir: &Path) -> PathBuf { save_dir.join(SWAPPER_DIR).join(SAVES_DIR) }

fn set_path(value: &str, what: &'static str) -> Result<PathBuf> {
    if value.trim().is_empty() {
        return Err(SwapError::ConfigurationMissing(what));
    }
    Ok(PathBuf::from(value))
}

fn existing_dir(value: &str, what: &'static str) -> Result<PathBuf> {
    let p = set_path(value, what)?;
    if !p.is_dir() {
        return Err(SwapError::ConfigurationMissing(what));
    }
    Ok(p)
}
