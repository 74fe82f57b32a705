//! Error types for provision-graph.

use thiserror::Error;

use provision_core::ConfigError;
use provision_renderer::RenderError;
use provision_sync::{RemoteError, RunFailure, StoreError};

/// Failure of one scheduled or manual job execution.
#[derive(Debug, Error)]
pub enum JobError {
    /// Settings are missing or malformed; nothing was contacted.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// User template overrides failed to load.
    #[error("invitation templates invalid: {0}")]
    Templates(#[from] RenderError),

    /// The token endpoint rejected the client credentials or was unreachable.
    #[error("authentication failed: {0}")]
    Authentication(#[source] RemoteError),

    /// Direct cursor store access (outside a run) failed.
    #[error("cursor store error: {0}")]
    Storage(#[from] StoreError),

    /// The reconciliation run itself failed.
    #[error(transparent)]
    Run(#[from] RunFailure),
}

impl JobError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Configuration(_) => "configuration",
            JobError::Templates(_) => "templates",
            JobError::Authentication(_) => "authentication",
            JobError::Storage(_) => "storage",
            JobError::Run(_) => "run",
        }
    }
}

/// Map a ureq failure onto the transport-neutral [`RemoteError`].
pub(crate) fn map_ureq_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            status_error(status, &body)
        }
        ureq::Error::Transport(transport) => RemoteError::transport(transport.to_string()),
    }
}

/// Classify an HTTP error status, extracting the service's own message when
/// the body carries one.
pub(crate) fn status_error(status: u16, body: &str) -> RemoteError {
    let message = crate::dto::error_message(body);
    match status {
        401 | 403 => RemoteError::Forbidden { status, message },
        404 => RemoteError::NotFound { message },
        429 => RemoteError::RateLimited { message },
        _ => RemoteError::Status { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, true)]
    #[case(403, true)]
    #[case(400, false)]
    #[case(500, false)]
    fn permission_statuses(#[case] status: u16, #[case] permission: bool) {
        assert_eq!(status_error(status, "").is_permission(), permission);
    }

    #[test]
    fn graph_error_message_is_extracted() {
        let body = r#"{"error":{"code":"Request_ResourceNotFound","message":"Resource 'u1' does not exist."}}"#;
        assert_eq!(
            status_error(404, body),
            RemoteError::NotFound {
                message: "Request_ResourceNotFound: Resource 'u1' does not exist.".into()
            }
        );
    }

    #[test]
    fn throttling_is_transient() {
        assert!(status_error(429, "slow down").is_transient());
        assert!(status_error(503, "").is_transient());
        assert!(!status_error(400, "").is_transient());
    }

    #[test]
    fn job_error_kinds() {
        let err = JobError::Authentication(RemoteError::transport("dns"));
        assert_eq!(err.kind(), "authentication");
        assert!(err.to_string().starts_with("authentication failed"));
    }
}
