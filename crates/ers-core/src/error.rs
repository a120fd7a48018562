//! Error taxonomy for slot, backup and swap operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::status::Severity;

#[derive(Debug, Error)]
pub enum SwapError {
    /// A required path is unset or does not exist. Nothing was touched.
    #[error("{0} is not set or does not exist")]
    ConfigurationMissing(&'static str),

    #[error("Elden Ring is currently running. Please close the game before swapping saves.")]
    GameRunning,

    #[error("a save named '{existing}' already exists; choose a different name than '{requested}'")]
    NameCollision { requested: String, existing: String },

    #[error("save '{0}' does not exist")]
    SlotNotFound(String),

    #[error("invalid save name: {0:?}")]
    InvalidName(String),

    /// A multi-file sequence stopped at `step`; earlier steps stay applied.
    #[error("{step} failed: {source}")]
    PartialIo {
        step: &'static str,
        #[source]
        source: io::Error,
    },

    /// The active save location was cleared but the target bundle could not be copied in.
    #[error(
        "active save location was cleared but loading '{target}' failed: {source}; \
         the previous save is archived in its slot and in the timestamped backups"
    )]
    ActiveSaveCleared {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Slot directory was renamed but some member files still carry the old prefix.
    #[error(
        "save renamed to '{new}' but {} file(s) still carry the '{old}' prefix: {source}",
        .stale.len()
    )]
    RenameIncomplete {
        old: String,
        new: String,
        stale: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Filesystem(#[from] io::Error),
}

impl SwapError {
    pub fn partial(step: &'static str) -> impl FnOnce(io::Error) -> SwapError {
        move |source| SwapError::PartialIo { step, source }
    }

    /// Dirty-but-recoverable states are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            SwapError::RenameIncomplete { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;
