//! Timestamped, retention-capped backups of the active save bundle.
//!
//! Backups live flat in one directory, named `{slot}_{YYYY-MM-DD_HH-MM-SS}_{original}`.
//! They are copied, never moved, and never modified after creation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::{Result, SwapError};
use crate::matcher::{file_name_str, list_save_bundle};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const TIMESTAMP_LEN: usize = "YYYY-MM-DD_HH-MM-SS".len();
pub const MAX_BACKUPS_PER_SLOT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub file_name: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    keep: usize,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), keep: MAX_BACKUPS_PER_SLOT }
    }

    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Copy every bundle file in `source_dir` into the backup area, stamped with the current time.
    pub fn create_backup(&self, slot: &str, source_dir: &Path) -> Result<Vec<PathBuf>> {
        self.create_backup_at(slot, source_dir, Local::now().naive_local())
    }

    pub fn create_backup_at(
        &self,
        slot: &str,
        source_dir: &Path,
        at: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let files = list_save_bundle(source_dir).map_err(SwapError::partial("listing save files"))?;
        self.backup_files_at(slot, &files, at)
    }

    /// Copy the given files; stops at the first failure and leaves earlier copies in place.
    pub fn backup_files_at(
        &self,
        slot: &str,
        files: &[PathBuf],
        at: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir).map_err(SwapError::partial("creating backup directory"))?;
        let ts = at.format(TIMESTAMP_FORMAT);
        let mut written = Vec::with_capacity(files.len());
        for src in files {
            let Some(name) = file_name_str(src) else { continue };
            let dest = self.dir.join(format!("{}_{}_{}", slot, ts, name));
            fs::copy(src, &dest).map_err(SwapError::partial("copying timestamped backup"))?;
            log::debug!("backup {} -> {}", src.display(), dest.display());
            written.push(dest);
        }
        Ok(written)
    }

    /// Backups owned by `slot`, oldest first. Names with an unparseable timestamp are skipped.
    pub fn list_backups(&self, slot: &str) -> io::Result<Vec<BackupEntry>> {
        let mut out = Vec::new();
        if !self.dir.is_dir() {
            return Ok(out);
        }
        for e in fs::read_dir(&self.dir)? {
            let e = e?;
            let Ok(name) = e.file_name().into_string() else { continue };
            if let Some(timestamp) = parse_backup_timestamp(slot, &name) {
                out.push(BackupEntry { file_name: name, timestamp });
            }
        }
        // stable: equal timestamps keep listing order
        out.sort_by_key(|b| b.timestamp);
        Ok(out)
    }

    /// Delete the oldest backups of `slot` until at most `keep` remain. Returns removed names.
    pub fn prune(&self, slot: &str) -> io::Result<Vec<String>> {
        let backups = self.list_backups(slot)?;
        let excess = backups.len().saturating_sub(self.keep);
        let mut removed = Vec::with_capacity(excess);
        for b in backups.into_iter().take(excess) {
            fs::remove_file(self.dir.join(&b.file_name))?;
            log::info!("removed old backup {}", b.file_name);
            removed.push(b.file_name);
        }
        Ok(removed)
    }
}

/// Timestamp of a backup file named `{slot}_{timestamp}_...`, if it belongs to `slot`.
pub fn parse_backup_timestamp(slot: &str, file_name: &str) -> Option<NaiveDateTime> {
    let rest = file_name.strip_prefix(slot)?.strip_prefix('_')?;
    let ts = rest.get(..TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()
}
