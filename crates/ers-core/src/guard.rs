//! Is the game running? Swaps are refused while it is.

use std::io;
use std::process::Command;

/// Executables that mean the save files may be held open.
pub const GAME_PROCESSES: &[&str] = &["eldenring.exe", "start_protected_game.exe", "EasyAntiCheat_EOS.exe"];

pub trait Guard {
    /// `Err` means the process list could not be inspected; callers treat that as running.
    fn game_running(&self) -> io::Result<bool>;
}

/// Checks the OS process list.
#[derive(Debug, Clone, Default)]
pub struct ProcessGuard;

impl Guard for ProcessGuard {
    fn game_running(&self) -> io::Result<bool> {
        let listing = process_listing()?;
        Ok(listing_mentions_game(&listing))
    }
}

#[cfg(windows)]
fn process_listing() -> io::Result<String> { run_listing(Command::new("tasklist").arg("/FO").arg("CSV")) }

#[cfg(not(windows))]
fn process_listing() -> io::Result<String> { run_listing(Command::new("ps").args(["-A", "-o", "args="])) }

fn run_listing(cmd: &mut Command) -> io::Result<String> {
    let out = cmd.output()?;
    if !out.status.success() {
        return Err(io::Error::other(format!("process listing exited with {}", out.status)));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// `ps -o comm` cuts names to this many bytes.
const COMM_LEN: usize = 15;

/// Matches full names anywhere in a line, or a line that is exactly a truncated name.
pub fn listing_mentions_game(listing: &str) -> bool {
    let listing = listing.to_lowercase();
    GAME_PROCESSES.iter().any(|p| {
        let p = p.to_lowercase();
        let short = &p[..p.len().min(COMM_LEN)];
        listing.contains(&p) || listing.lines().any(|l| l.trim() == short)
    })
}
