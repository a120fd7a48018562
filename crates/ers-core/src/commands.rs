//! User-facing command surface. Every command ends in a list of statuses;
//! errors stop here and never propagate further.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use crate::engine::SwapEngine;
use crate::error::SwapError;
use crate::guard::Guard;
use crate::status::{Report, Status};

/// Shows a directory to the user (file browser, terminal, ...).
pub trait Opener {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// Hands the path to the platform's file browser.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        let program = if cfg!(windows) {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Process::new(program).arg(path).spawn().map(|_| ())
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    SetSaveLocation(PathBuf),
    SetBackupLocation(PathBuf),
    InitialSetup { save_location: PathBuf, backup_location: PathBuf, name: String },
    CreateFreshSave(String),
    AddExistingSave { source: PathBuf, name: String },
    RenameSave { old: String, new: String },
    RepairSave { name: String, stale: String },
    OpenSaveLocation,
    OpenBackupLocation,
    ListSaves,
    SelectSave(String),
}

pub fn execute<G: Guard>(engine: &mut SwapEngine<G>, cmd: Command, opener: &dyn Opener) -> Vec<Status> {
    let mut report = Report::default();
    let res = match cmd {
        Command::SetSaveLocation(dir) => engine.set_save_location(&mut report, &dir),
        Command::SetBackupLocation(dir) => engine.set_backup_location(&mut report, &dir),
        Command::InitialSetup { save_location, backup_location, name } => {
            engine.initial_setup(&mut report, &save_location, &backup_location, &name)
        }
        Command::CreateFreshSave(name) => engine.create_fresh_save(&mut report, &name),
        Command::AddExistingSave { source, name } => engine.add_existing_save(&mut report, &source, &name),
        Command::RenameSave { old, new } => engine.rename_slot(&mut report, &old, &new),
        Command::RepairSave { name, stale } => engine.repair_slot(&mut report, &name, &stale),
        Command::OpenSaveLocation => engine
            .config()
            .save_dir()
            .and_then(|p| open_dir(&mut report, opener, &p)),
        Command::OpenBackupLocation => engine
            .config()
            .backup_dir()
            .and_then(|p| open_dir(&mut report, opener, &p)),
        Command::ListSaves => engine.list_slots().map(|names| {
            let current = engine.current_slot();
            if names.is_empty() {
                report.push(Status::info("No saves in the archive yet"));
            }
            for n in names {
                let marker = if n == current { " (current)" } else { "" };
                report.push(Status::info(format!("{}{}", n, marker)));
            }
        }),
        Command::SelectSave(name) => engine.swap(&mut report, &name),
    };
    report.finish(res)
}

fn open_dir(report: &mut Report, opener: &dyn Opener, dir: &Path) -> Result<(), SwapError> {
    opener.open(dir)?;
    report.push(Status::success(format!("Opened {}", dir.display())));
    Ok(())
}
