use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SAVE_PREFIX: &str = "ER0000";
pub const SAVE_EXT: &str = ".sl2";
pub const BACKUP_SUFFIX: &str = ".bak";
pub const CONFIG_EXT: &str = ".vdf";

/// True for the primary save (`ER0000*.sl2`) and its companion (`ER0000*.sl2.bak`).
pub fn matches_save_bundle(name: &str) -> bool {
    name.starts_with(SAVE_PREFIX)
        && (name.ends_with(SAVE_EXT)
            || name
                .strip_suffix(BACKUP_SUFFIX)
                .is_some_and(|stem| stem.ends_with(SAVE_EXT)))
}

/// Game-generated config files. Deleted on a fresh save, never backed up or swapped.
pub fn matches_config_file(name: &str) -> bool { name.ends_with(CONFIG_EXT) }

pub fn is_bundle_or_config(name: &str) -> bool {
    matches_save_bundle(name) || matches_config_file(name)
}

/// Regular files directly under `dir` whose name satisfies `pred`, in listing order.
pub fn list_matching(dir: &Path, pred: impl Fn(&str) -> bool) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in fs::read_dir(dir)? {
        let e = e?;
        let p = e.path();
        if p.is_file() && p.file_name().and_then(|s| s.to_str()).map(&pred) == Some(true) {
            out.push(p);
        }
    }
    Ok(out)
}

pub fn list_save_bundle(dir: &Path) -> io::Result<Vec<PathBuf>> {
    list_matching(dir, matches_save_bundle)
}

pub fn file_name_str(p: &Path) -> Option<&str> { p.file_name().and_then(|s| s.to_str()) }
