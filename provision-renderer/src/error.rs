//! Error types for provision-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The rendered subject came out empty.
    #[error("rendered invitation subject is empty")]
    EmptySubject,
}
