use std::path::{Path, PathBuf};

pub const DAEMON_STDOUT_LOG: &str = "daemon.log";
pub const DAEMON_STDERR_LOG: &str = "daemon-err.log";
pub const DAEMON_SOCKET: &str = "daemon.sock";

/// `~/.provision`, shared with the configuration file.
pub fn provision_root(home: &Path) -> PathBuf {
    home.join(".provision")
}

pub fn run_dir(home: &Path) -> PathBuf {
    provision_root(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    run_dir(home).join(DAEMON_SOCKET)
}

pub fn logs_dir(home: &Path) -> PathBuf {
    provision_root(home).join("logs")
}

/// Every log line.
pub fn stdout_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(DAEMON_STDOUT_LOG)
}

/// Warnings and errors only.
pub fn stderr_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(DAEMON_STDERR_LOG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_provision_root() {
        let home = Path::new("/home/ops");
        assert_eq!(socket_path(home), Path::new("/home/ops/.provision/run/daemon.sock"));
        assert_eq!(stderr_log_path(home), Path::new("/home/ops/.provision/logs/daemon-err.log"));
        assert_eq!(
            provision_core::config::config_path_at(home).parent(),
            Some(provision_root(home).as_path())
        );
    }
}
