//! Error types for provision-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while assembling [`crate::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the settings file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required setting is absent or blank.
    #[error("required setting `{key}` is missing")]
    Missing { key: &'static str },

    /// A setting is present but cannot be used.
    #[error("setting `{key}` is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.provision/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
