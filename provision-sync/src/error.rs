//! Error types for provision-sync.

use std::path::PathBuf;

use thiserror::Error;

use provision_renderer::RenderError;

/// Failure reported by a remote collaborator (directory, calendar, blob service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network transport failed before a response arrived.
    #[error("transport failed: {message}")]
    Transport { message: String },

    /// The caller is not allowed to perform the operation (HTTP 401/403).
    #[error("permission denied ({status}): {message}")]
    Forbidden { status: u16, message: String },

    /// The target object does not exist.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The service throttled the request.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Any other non-success status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("response decode failed: {message}")]
    Decode { message: String },

    /// The adapter refused to issue the request.
    #[error("request rejected: {message}")]
    InvalidRequest { message: String },
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        RemoteError::Transport { message: message.into() }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        RemoteError::Decode { message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        RemoteError::InvalidRequest { message: message.into() }
    }

    /// Permission failures recur deterministically until an operator acts.
    pub fn is_permission(&self) -> bool {
        matches!(self, RemoteError::Forbidden { .. })
    }

    /// Whether a later attempt is expected to succeed on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport { .. } | RemoteError::RateLimited { .. } => true,
            RemoteError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from the cursor's backing blob store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote blob service failed.
    #[error("blob service error: {0}")]
    Remote(#[from] RemoteError),

    /// JSON serialization of the cursor document failed.
    #[error("cursor document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run-level errors. Each variant aborts the run; none of them is raised for a
/// single candidate.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading the previous cursor failed (other than "not found").
    #[error("cursor load failed: {0}")]
    CursorLoad(#[source] StoreError),

    /// Persisting the new cursor failed; the previous cursor stays authoritative.
    #[error("cursor save failed: {0}")]
    CursorSave(#[source] StoreError),

    /// The change feed failed mid-pagination.
    #[error("change feed failed on page {page}: {source}")]
    Feed {
        page: usize,
        #[source]
        source: RemoteError,
    },

    /// The batched invitation could not be rendered.
    #[error("invitation render failed: {0}")]
    Render(#[from] RenderError),

    /// The batched invitation could not be sent.
    #[error("invitation send failed for {recipients} recipient(s): {source}")]
    Notify {
        recipients: usize,
        #[source]
        source: RemoteError,
    },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RemoteError::transport("reset"), true)]
    #[case(RemoteError::RateLimited { message: "retry later".into() }, true)]
    #[case(RemoteError::Status { status: 503, message: String::new() }, true)]
    #[case(RemoteError::Status { status: 400, message: String::new() }, false)]
    #[case(RemoteError::Forbidden { status: 403, message: String::new() }, false)]
    #[case(RemoteError::decode("bad json"), false)]
    fn transient_classification(#[case] err: RemoteError, #[case] transient: bool) {
        assert_eq!(err.is_transient(), transient);
    }

    #[test]
    fn permission_failures_are_not_transient() {
        let err = RemoteError::Forbidden {
            status: 401,
            message: "token lacks GroupMember.ReadWrite.All".into(),
        };
        assert!(err.is_permission());
        assert!(!err.is_transient());
    }
}
