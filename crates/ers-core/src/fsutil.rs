use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::matcher::matches_save_bundle;

/// Poll until `path` exists or `timeout` elapses.
pub fn wait_for_file(path: &Path, timeout: Duration, interval: Duration) -> bool {
    let start = Instant::now();
    loop {
        if path.exists() {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        thread::sleep(interval);
    }
}

/// Save bundle files under `source`.
///
/// A file is taken as-is (plus its `.bak` sibling when present). A directory is
/// searched two levels deep so a Steam-ID subfolder is found from its parent.
pub fn find_bundle_files(source: &Path) -> io::Result<Vec<PathBuf>> {
    if source.is_file() {
        let mut out = vec![source.to_path_buf()];
        let mut bak = source.as_os_str().to_owned();
        bak.push(crate::matcher::BACKUP_SUFFIX);
        let bak = PathBuf::from(bak);
        if bak.is_file() {
            out.push(bak);
        }
        return Ok(out);
    }
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("not found: {}", source.display()),
        ));
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(source).max_depth(2) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        if entry.file_type().is_file() && entry.file_name().to_str().is_some_and(matches_save_bundle) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// Delete every file in `dir` matching `pred`. Stops at the first failure.
pub fn remove_matching(dir: &Path, pred: impl Fn(&str) -> bool) -> io::Result<Vec<PathBuf>> {
    let files = crate::matcher::list_matching(dir, pred)?;
    for f in &files {
        fs::remove_file(f)?;
        log::debug!("removed {}", f.display());
    }
    Ok(files)
}
