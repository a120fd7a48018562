//! ers-core: save slot archive and swap engine for Elden Ring saves
//!
//! The surface is small:
//! - File matching for the save bundle (`ER0000*.sl2`, `.sl2.bak`) and game config (`.vdf`)
//! - Timestamped backups, capped per save name
//! - Slot archive (one directory per named save) with case-insensitive rename
//! - Swap engine that backs up before every destructive step
//! - Command layer turning every outcome into status lines
//!
pub mod backups;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fsutil;
pub mod guard;
pub mod matcher;
pub mod slots;
pub mod status;

pub use backups::{BackupEntry, BackupStore, MAX_BACKUPS_PER_SLOT};
pub use commands::{Command, Opener, SystemOpener, execute};
pub use config::Config;
pub use engine::SwapEngine;
pub use error::{Result, SwapError};
pub use guard::{Guard, ProcessGuard};
pub use matcher::{matches_config_file, matches_save_bundle};
pub use slots::{SlotFile, SlotStore};
pub use status::{Report, Severity, Status};
