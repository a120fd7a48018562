//! Archive of named save slots.
//!
//! Each slot is a directory under the archive root holding the bundle files
//! prefixed with the slot name: `{slot}/{slot}_{original}`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, SwapError};
use crate::matcher::file_name_str;

/// A file stored in a slot together with the name it had in the active save location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFile {
    pub path: PathBuf,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    pub fn slot_dir(&self, name: &str) -> PathBuf { self.root.join(name) }

    pub fn exists(&self, name: &str) -> bool { self.slot_dir(name).is_dir() }

    /// Slot names in directory listing order.
    pub fn list_slots(&self) -> io::Result<Vec<String>> {
        let mut out = Vec::new();
        for e in fs::read_dir(&self.root)? {
            let e = e?;
            if e.path().is_dir()
                && let Ok(name) = e.file_name().into_string()
            {
                out.push(name);
            }
        }
        Ok(out)
    }

    pub fn create_slot(&self, name: &str) -> io::Result<PathBuf> {
        let dir = self.slot_dir(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Copy `sources` into the slot, adding the `{name}_` prefix where missing.
    pub fn write_bundle_into_slot(&self, name: &str, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let dir = self.create_slot(name).map_err(SwapError::partial("creating save slot"))?;
        let prefix = format!("{}_", name);
        let mut written = Vec::with_capacity(sources.len());
        for src in sources {
            let Some(file) = file_name_str(src) else { continue };
            let dest_name = if file.starts_with(&prefix) {
                file.to_string()
            } else {
                format!("{}{}", prefix, file)
            };
            let dest = dir.join(dest_name);
            fs::copy(src, &dest).map_err(SwapError::partial("copying save into slot"))?;
            log::debug!("archived {} -> {}", src.display(), dest.display());
            written.push(dest);
        }
        Ok(written)
    }

    /// Files of the slot with their pre-archive names recovered.
    pub fn read_bundle_from_slot(&self, name: &str) -> Result<Vec<SlotFile>> {
        let dir = self.slot_dir(name);
        if !dir.is_dir() {
            return Err(SwapError::SlotNotFound(name.to_string()));
        }
        let mut out = Vec::new();
        for e in fs::read_dir(&dir)? {
            let path = e?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file) = file_name_str(&path) else { continue };
            let original_name = strip_slot_prefix(name, file);
            out.push(SlotFile { original_name, path });
        }
        Ok(out)
    }

    /// Rename a slot directory and re-prefix its files.
    ///
    /// Uniqueness is case-insensitive against every other slot; a case-only
    /// rename of the same slot is allowed. If a file rename fails after the
    /// directory moved, nothing is rolled back: the error lists the stale files
    /// so [`SlotStore::repair_prefixes`] can finish the job.
    pub fn rename_slot(&self, old: &str, new: &str) -> Result<()> {
        validate_slot_name(new)?;
        if !self.exists(old) {
            return Err(SwapError::SlotNotFound(old.to_string()));
        }
        let new_lower = new.to_lowercase();
        let old_lower = old.to_lowercase();
        for existing in self.list_slots()? {
            let existing_lower = existing.to_lowercase();
            if existing_lower == new_lower && existing_lower != old_lower {
                return Err(SwapError::NameCollision {
                    requested: new.to_string(),
                    existing,
                });
            }
        }
        let new_dir = self.slot_dir(new);
        fs::rename(self.slot_dir(old), &new_dir).map_err(SwapError::partial("renaming save directory"))?;
        self.repair_prefixes(new, old).map_err(|(stale, source)| SwapError::RenameIncomplete {
            old: old.to_string(),
            new: new.to_string(),
            stale,
            source,
        })
    }

    /// Rename member files of `name` by replacing the first `stale` occurrence with `name`.
    ///
    /// On failure returns the files still waiting to be renamed.
    pub fn repair_prefixes(
        &self,
        name: &str,
        stale: &str,
    ) -> std::result::Result<(), (Vec<PathBuf>, io::Error)> {
        let dir = self.slot_dir(name);
        let files = match list_files(&dir) {
            Ok(f) => f,
            Err(e) => return Err((Vec::new(), e)),
        };
        let pending: Vec<PathBuf> = files
            .into_iter()
            .filter(|p| file_name_str(p).is_some_and(|f| carries_stale_prefix(f, name, stale)))
            .collect();
        for (i, path) in pending.iter().enumerate() {
            let Some(file) = file_name_str(path) else { continue };
            let renamed = dir.join(file.replacen(stale, name, 1));
            if let Err(e) = fs::rename(path, &renamed) {
                return Err((pending[i..].to_vec(), e));
            }
            log::debug!("renamed {} -> {}", path.display(), renamed.display());
        }
        Ok(())
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in fs::read_dir(dir)? {
        let p = e?.path();
        if p.is_file() {
            out.push(p);
        }
    }
    Ok(out)
}

// When one prefix extends the other ("A_" vs "A_x_") the longer match wins.
fn carries_stale_prefix(file: &str, name: &str, stale: &str) -> bool {
    let stale_prefix = format!("{}_", stale);
    let name_prefix = format!("{}_", name);
    if !file.starts_with(&stale_prefix) {
        return false;
    }
    !(file.starts_with(&name_prefix) && name_prefix.len() >= stale_prefix.len())
}

/// `{slot}_ER0000.sl2` -> `ER0000.sl2`. Files lacking the exact prefix lose their first `_` token.
pub fn strip_slot_prefix(slot: &str, file: &str) -> String {
    if let Some(rest) = file.strip_prefix(slot).and_then(|r| r.strip_prefix('_')) {
        return rest.to_string();
    }
    match file.split_once('_') {
        Some((_, rest)) => rest.to_string(),
        None => file.to_string(),
    }
}

pub fn validate_slot_name(name: &str) -> Result<()> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':']);
    if bad {
        return Err(SwapError::InvalidName(name.to_string()));
    }
    Ok(())
}
