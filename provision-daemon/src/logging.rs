//! `tracing` subscriber setup for the CLI and the daemon.
//!
//! The filter comes from `RUST_LOG` (default `info`). Setting
//! `PROVISION_LOG_FORMAT=json` switches to one JSON object per line.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

use crate::paths::{stderr_log_path, stdout_log_path};

pub const LOG_FORMAT_ENV: &str = "PROVISION_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// Appends to a log file, reopening it for every event so a rotated file is
/// picked up without restarting.
#[derive(Debug, Clone)]
pub struct AppendFile {
    path: PathBuf,
}

impl AppendFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

pub enum AppendWriter {
    File(File),
    /// The log file could not be opened.
    Stderr(io::Stderr),
}

impl Write for AppendWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            AppendWriter::File(file) => file.write(buf),
            AppendWriter::Stderr(stderr) => stderr.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            AppendWriter::File(file) => file.flush(),
            AppendWriter::Stderr(stderr) => stderr.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for AppendFile {
    type Writer = AppendWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => AppendWriter::File(file),
            Err(_) => AppendWriter::Stderr(io::stderr()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr. Used by one-shot CLI commands.
pub fn init_stderr() {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(io::stderr);
    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

/// Log to `daemon.log`, with warnings and errors also in `daemon-err.log`.
pub fn init_files(home: &Path) {
    let writer = AppendFile::new(stdout_log_path(home))
        .and(AppendFile::new(stderr_log_path(home)).with_max_level(Level::WARN));
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);
    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn json_format_is_opt_in() {
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
    }

    #[test]
    fn append_file_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let target = AppendFile::new(dir.path().join("daemon.log"));
        target.make_writer().write_all(b"one\n").unwrap();
        target.make_writer().write_all(b"two\n").unwrap();
        let contents = std::fs::read_to_string(dir.path().join("daemon.log")).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }

    #[test]
    fn missing_directory_falls_back_to_stderr() {
        let dir = TempDir::new().unwrap();
        let target = AppendFile::new(dir.path().join("absent").join("daemon.log"));
        assert!(matches!(target.make_writer(), AppendWriter::Stderr(_)));
    }
}
