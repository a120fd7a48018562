//! Swap engine: moves bundles between the active save location and the slot
//! archive, taking a timestamped backup before anything destructive.
//!
//! Every operation takes a [`Report`] and records what it did there. Failures
//! are returned as [`SwapError`] and nothing already done is rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::backups::{BackupEntry, BackupStore};
use crate::config::{Config, DEFAULT_SLOT};
use crate::error::{Result, SwapError};
use crate::fsutil::{find_bundle_files, remove_matching, wait_for_file};
use crate::guard::Guard;
use crate::matcher::{SAVE_EXT, SAVE_PREFIX, is_bundle_or_config, list_save_bundle};
use crate::slots::{SlotStore, validate_slot_name};
use crate::status::{Report, Status};

pub struct SwapEngine<G> {
    config: Config,
    config_path: PathBuf,
    guard: G,
}

impl<G: Guard> SwapEngine<G> {
    pub fn new(config: Config, config_path: impl Into<PathBuf>, guard: G) -> Self {
        Self { config, config_path: config_path.into(), guard }
    }

    /// Read the config file (missing file = defaults) and build an engine around it.
    pub fn load(config_path: impl Into<PathBuf>, guard: G) -> Result<Self> {
        let config_path = config_path.into();
        let config = Config::load(&config_path)?;
        Ok(Self::new(config, config_path, guard))
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn current_slot(&self) -> &str { self.config.current_slot() }

    pub fn needs_setup(&self) -> bool { !self.config.setup_complete }

    pub fn persist(&self) -> Result<()> { self.config.save(&self.config_path) }

    pub fn slot_store(&self) -> Result<SlotStore> { Ok(SlotStore::new(self.config.archive_root()?)) }

    pub fn backup_store(&self) -> Result<BackupStore> {
        Ok(BackupStore::new(self.config.timestamp_backup_dir()?))
    }

    pub fn set_save_location(&mut self, report: &mut Report, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(SwapError::ConfigurationMissing("save location"));
        }
        self.config.set_save_location(dir);
        fs::create_dir_all(self.config.archive_root()?)?;
        self.persist()?;
        report.push(Status::success(format!("Save location set to {}", dir.display())));
        Ok(())
    }

    pub fn set_backup_location(&mut self, report: &mut Report, dir: &Path) -> Result<()> {
        self.config.set_backup_location(dir);
        fs::create_dir_all(self.config.timestamp_backup_dir()?)?;
        self.persist()?;
        report.push(Status::success(format!("Backup location set to {}", dir.display())));
        Ok(())
    }

    /// First run: record both locations and take an unpruned backup of the current save.
    pub fn initial_setup(
        &mut self,
        report: &mut Report,
        save_dir: &Path,
        backup_dir: &Path,
        name: &str,
    ) -> Result<()> {
        let name = if name.trim().is_empty() { DEFAULT_SLOT } else { name };
        validate_slot_name(name)?;
        self.set_save_location(report, save_dir)?;
        self.set_backup_location(report, backup_dir)?;
        if let Err(e) = self.backup_active(report, name, false) {
            report.push(Status::warning(format!("Error during timestamped backup: {}", e)));
        }
        self.config.last_used_save = Some(name.to_string());
        self.config.setup_complete = true;
        self.persist()?;
        report.push(Status::success(format!("Setup complete; current save is '{}'", name)));
        Ok(())
    }

    /// Make `target` the active save.
    ///
    /// The current bundle is backed up and archived under the current slot name
    /// before the active location is cleared. If loading `target` fails after
    /// that, the error is [`SwapError::ActiveSaveCleared`].
    pub fn swap(&mut self, report: &mut Report, target: &str) -> Result<()> {
        let save_dir = self.config.save_dir()?;
        let slots = self.slot_store()?;
        self.ensure_game_stopped(report)?;
        if !slots.exists(target) {
            return Err(SwapError::SlotNotFound(target.to_string()));
        }
        let current = self.current_slot().to_string();

        if let Err(e) = self.backup_active(report, &current, true) {
            report.push(Status::warning(format!("Error during timestamped backup: {}; continuing", e)));
        }

        let active = list_save_bundle(&save_dir).map_err(SwapError::partial("listing active save"))?;
        slots.write_bundle_into_slot(&current, &active)?;
        report.push(Status::info(format!("Archived current save into slot '{}'", current)));

        for f in &active {
            fs::remove_file(f).map_err(SwapError::partial("clearing active save location"))?;
        }

        let cleared = |source| SwapError::ActiveSaveCleared { target: target.to_string(), source };
        let incoming = slots.read_bundle_from_slot(target).map_err(|e| match e {
            SwapError::Filesystem(source) => cleared(source),
            other => cleared(io::Error::other(other.to_string())),
        })?;
        for file in &incoming {
            let dest = save_dir.join(&file.original_name);
            fs::copy(&file.path, &dest).map_err(cleared)?;
            log::debug!("loaded {} -> {}", file.path.display(), dest.display());
        }

        self.config.last_used_save = Some(target.to_string());
        self.persist()?;
        report.push(Status::success(format!("Successfully swapped to save: {}", target)));
        Ok(())
    }

    /// Back up the current save, wipe save and config files, and start a new named save.
    pub fn create_fresh_save(&mut self, report: &mut Report, name: &str) -> Result<()> {
        validate_slot_name(name)?;
        let save_dir = self.config.save_dir()?;
        self.ensure_game_stopped(report)?;
        let current = self.current_slot().to_string();

        // Nothing else holds the current bundle, so a failed backup stops here.
        self.backup_active(report, &current, true)?;

        if let Ok(slots) = self.slot_store()
            && let Ok(names) = slots.list_slots()
            && let Some(existing) = names.iter().find(|n| n.to_lowercase() == name.to_lowercase())
        {
            report.push(Status::warning(format!(
                "A save named '{}' already exists in the archive; swapping away will overwrite it",
                existing
            )));
        }

        remove_matching(&save_dir, is_bundle_or_config)
            .map_err(SwapError::partial("clearing active save location"))?;

        self.config.last_used_save = Some(name.to_string());
        self.persist()?;
        report.push(Status::success(format!("Successfully created fresh save: {}", name)));
        Ok(())
    }

    /// Ingest a save from anywhere into the backup history under `name`.
    /// The active save and current slot are left alone.
    pub fn add_existing_save(&mut self, report: &mut Report, source: &Path, name: &str) -> Result<()> {
        validate_slot_name(name)?;
        let backups = self.backup_store()?;
        let files = find_bundle_files(source).map_err(SwapError::partial("locating save files"))?;
        if files.is_empty() {
            return Err(SwapError::PartialIo {
                step: "locating save files",
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no {}*{} files in {}", SAVE_PREFIX, SAVE_EXT, source.display()),
                ),
            });
        }
        backups.backup_files_at(name, &files, Local::now().naive_local())?;
        for removed in backups.prune(name).map_err(SwapError::partial("pruning old backups"))? {
            report.push(Status::info(format!("Removed old backup: {}", removed)));
        }
        report.push(Status::success(format!("Added save '{}' from {}", name, source.display())));
        Ok(())
    }

    pub fn rename_slot(&mut self, report: &mut Report, old: &str, new: &str) -> Result<()> {
        validate_slot_name(new)?;
        let slots = self.slot_store()?;
        let renaming_current = old == self.current_slot();
        if renaming_current
            && let Err(e) = self.backup_active(report, old, true)
        {
            report.push(Status::warning(format!("Error during timestamped backup: {}; continuing", e)));
        }

        let res = slots.rename_slot(old, new);
        // The directory has moved even when some files kept the old prefix.
        let dir_moved = matches!(&res, Ok(()) | Err(SwapError::RenameIncomplete { .. }));
        if dir_moved && renaming_current {
            self.config.last_used_save = Some(new.to_string());
            self.persist()?;
        }
        res?;
        report.push(Status::success(format!("Save '{}' renamed to '{}'.", old, new)));
        Ok(())
    }

    /// Finish an interrupted rename by re-prefixing files still named after `stale`.
    pub fn repair_slot(&mut self, report: &mut Report, name: &str, stale: &str) -> Result<()> {
        let slots = self.slot_store()?;
        if !slots.exists(name) {
            return Err(SwapError::SlotNotFound(name.to_string()));
        }
        slots.repair_prefixes(name, stale).map_err(|(stale_files, source)| SwapError::RenameIncomplete {
            old: stale.to_string(),
            new: name.to_string(),
            stale: stale_files,
            source,
        })?;
        report.push(Status::success(format!("Save '{}' files carry the '{}' prefix", name, name)));
        Ok(())
    }

    /// Slot names in archive listing order. Creates the archive root when missing.
    pub fn list_slots(&self) -> Result<Vec<String>> {
        let slots = self.slot_store()?;
        if !slots.root().is_dir() {
            fs::create_dir_all(slots.root())?;
            return Ok(Vec::new());
        }
        Ok(slots.list_slots()?)
    }

    pub fn list_backups(&self, slot: &str) -> Result<Vec<BackupEntry>> {
        Ok(self.backup_store()?.list_backups(slot)?)
    }

    /// Wait for the game to write a primary save into the active location.
    pub fn wait_for_active_save(&self, timeout: Duration, interval: Duration) -> Result<bool> {
        let path = self.config.save_dir()?.join(format!("{}{}", SAVE_PREFIX, SAVE_EXT));
        Ok(wait_for_file(&path, timeout, interval))
    }

    fn ensure_game_stopped(&self, report: &mut Report) -> Result<()> {
        match self.guard.game_running() {
            Ok(false) => Ok(()),
            Ok(true) => Err(SwapError::GameRunning),
            Err(e) => {
                report.push(Status::warning(format!("Unable to verify Elden Ring is not running: {}", e)));
                Err(SwapError::GameRunning)
            }
        }
    }

    fn backup_active(&self, report: &mut Report, slot: &str, prune: bool) -> Result<()> {
        let save_dir = self.config.save_dir()?;
        let backups = self.backup_store()?;
        let written = backups.create_backup(slot, &save_dir)?;
        if written.is_empty() {
            report.push(Status::info(format!("No save files to back up for '{}'", slot)));
            return Ok(());
        }
        if prune {
            for removed in backups.prune(slot).map_err(SwapError::partial("pruning old backups"))? {
                report.push(Status::info(format!("Removed old backup: {}", removed)));
            }
        }
        report.push(Status::success(format!("Timestamped backup completed for save: {}.", slot)));
        Ok(())
    }
}
