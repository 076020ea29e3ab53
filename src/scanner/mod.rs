//! Event file discovery.
//!
//! Walks the logs directory for TensorBoard event files and keeps the most
//! recently modified one per experiment directory.

use crate::error::Result;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File name prefix of TensorBoard event files.
pub const EVENT_FILE_PREFIX: &str = "events.out.tfevents.";

/// A candidate event file with its modification time.
#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    modified: SystemTime,
}

/// Scanner for event files under a logs directory.
pub struct LogScanner {
    root: PathBuf,
}

impl LogScanner {
    /// Create a new scanner rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the latest event file per experiment directory.
    ///
    /// Files are ordered by modification time, newest first, ties broken by
    /// path. Only the first file seen for each containing directory is kept,
    /// so the result follows the newest-first order of the selected files.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself must be readable; anything below is best-effort
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_event_file(entry.path()) {
                continue;
            }
            let modified = match entry
                .metadata()
                .map_err(io::Error::from)
                .and_then(|m| m.modified())
            {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            candidates.push(Candidate {
                path: entry.into_path(),
                modified,
            });
        }

        candidates.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut selected = Vec::new();
        for candidate in candidates {
            let dir = candidate
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            if seen_dirs.insert(dir) {
                selected.push(candidate.path);
            } else {
                debug!("Ignoring older event file {}", candidate.path.display());
            }
        }

        debug!(
            "Found {} event files under {}",
            selected.len(),
            self.root.display()
        );
        Ok(selected)
    }
}

/// Check whether a path names an event file.
pub fn is_event_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(EVENT_FILE_PREFIX))
}

/// Find the latest event file per experiment directory under `logs_dir`.
pub fn find_event_files(logs_dir: &Path) -> Result<Vec<PathBuf>> {
    LogScanner::new(logs_dir).scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "dummy content").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_find_event_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("model1").join("events.out.tfevents.12345");
        touch(&file, 0);

        let files = find_event_files(dir.path()).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_latest_file_per_directory() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().join("resnet").join("seed_1");
        touch(&run.join("events.out.tfevents.old"), 100);
        touch(&run.join("events.out.tfevents.new"), 10);
        touch(&run.join("checkpoint.ckpt"), 0);

        let files = find_event_files(dir.path()).unwrap();
        assert_eq!(files, vec![run.join("events.out.tfevents.new")]);
    }

    #[test]
    fn test_directories_ordered_newest_first() {
        let dir = TempDir::new().unwrap();
        let older = dir.path().join("m").join("seed_1").join("events.out.tfevents.a");
        let newer = dir.path().join("m").join("seed_2").join("events.out.tfevents.b");
        touch(&older, 50);
        touch(&newer, 5);

        let files = find_event_files(dir.path()).unwrap();
        assert_eq!(files, vec![newer, older]);
    }

    #[test]
    fn test_ties_broken_by_path() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().join("m").join("r");
        let mtime = SystemTime::now() - Duration::from_secs(30);
        for name in ["events.out.tfevents.b", "events.out.tfevents.a"] {
            let path = run.join(name);
            fs::create_dir_all(&run).unwrap();
            fs::write(&path, "x").unwrap();
            File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(mtime)
                .unwrap();
        }

        let files = find_event_files(dir.path()).unwrap();
        assert_eq!(files, vec![run.join("events.out.tfevents.a")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().join("resnet").join("seed_1");
        let file = run.join("events.out.tfevents.1");
        touch(&file, 0);
        std::os::unix::fs::symlink(dir.path().join("gone"), run.join("latest_ckpt")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone"),
            run.join("events.out.tfevents.dangling"),
        )
        .unwrap();

        let files = find_event_files(dir.path()).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(find_event_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(find_event_files(dir.path()).unwrap().is_empty());
    }
}
