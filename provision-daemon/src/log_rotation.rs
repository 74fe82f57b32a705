//! Size-based rotation of the daemon's log files.
//!
//! `daemon.log` becomes `daemon.log.1`, older copies shift up by one and the
//! copy past [`LogRotation::keep`] is dropped. Writers reopen the file per
//! event, so the next line lands in a fresh `daemon.log`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{stderr_log_path, stdout_log_path};

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_KEEP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotation {
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            keep: DEFAULT_KEEP,
        }
    }
}

impl LogRotation {
    /// Rotate `log` when it has reached `max_bytes`. Returns the rotated
    /// size, or `None` when the file is missing or still small.
    pub fn rotate(&self, log: &Path) -> io::Result<Option<u64>> {
        let size = match fs::metadata(log) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        if size < self.max_bytes {
            return Ok(None);
        }

        if self.keep == 0 {
            fs::remove_file(log)?;
            return Ok(Some(size));
        }

        remove_if_present(&backup_path(log, self.keep))?;
        for n in (1..self.keep).rev() {
            let from = backup_path(log, n);
            if from.exists() {
                fs::rename(&from, backup_path(log, n + 1))?;
            }
        }
        fs::rename(log, backup_path(log, 1))?;
        Ok(Some(size))
    }

    /// Rotate both daemon logs under `home`. A failure on one file is logged
    /// and does not stop the other.
    pub fn rotate_all(&self, home: &Path) {
        for log in [stdout_log_path(home), stderr_log_path(home)] {
            match self.rotate(&log) {
                Ok(Some(bytes)) => tracing::info!(path = %log.display(), bytes, "log file rotated"),
                Ok(None) => {}
                Err(err) => tracing::warn!(path = %log.display(), error = %err, "log rotation failed"),
            }
        }
    }
}

/// `daemon.log` → `daemon.log.<n>`.
pub fn backup_path(log: &Path, n: usize) -> PathBuf {
    let mut name = log.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(format!(".{n}"));
    log.with_file_name(name)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SMALL: LogRotation = LogRotation {
        max_bytes: 16,
        keep: 3,
    };

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn small_or_missing_files_stay_put() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("daemon.log");
        assert_eq!(SMALL.rotate(&log).unwrap(), None);

        fs::write(&log, "short").unwrap();
        assert_eq!(SMALL.rotate(&log).unwrap(), None);
        assert!(!backup_path(&log, 1).exists());
    }

    #[test]
    fn oversized_file_moves_to_first_backup() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("daemon.log");
        fs::write(&log, "0123456789abcdef-run-finished").unwrap();

        assert_eq!(SMALL.rotate(&log).unwrap(), Some(29));
        assert!(!log.exists());
        assert_eq!(read(&backup_path(&log, 1)), "0123456789abcdef-run-finished");
    }

    #[test]
    fn backups_shift_and_oldest_is_dropped() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("daemon-err.log");
        for round in 1..=4 {
            fs::write(&log, format!("round {round} ................")).unwrap();
            SMALL.rotate(&log).unwrap();
        }

        assert!(read(&backup_path(&log, 1)).starts_with("round 4"));
        assert!(read(&backup_path(&log, 2)).starts_with("round 3"));
        assert!(read(&backup_path(&log, 3)).starts_with("round 2"));
        assert!(!backup_path(&log, 4).exists());
    }

    #[test]
    fn rotate_all_covers_both_daemon_logs() {
        let home = TempDir::new().unwrap();
        let out = stdout_log_path(home.path());
        let err = stderr_log_path(home.path());
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "x".repeat(32)).unwrap();
        fs::write(&err, "y".repeat(32)).unwrap();

        SMALL.rotate_all(home.path());

        assert!(backup_path(&out, 1).exists());
        assert!(backup_path(&err, 1).exists());
    }

    #[test]
    fn backup_names_append_the_index() {
        let path = backup_path(Path::new("/var/log/daemon.log"), 2);
        assert_eq!(path, Path::new("/var/log/daemon.log.2"));
    }
}
