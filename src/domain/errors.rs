//! Domain errors for the shared resource cache.

use thiserror::Error;

/// Format the individual failures of a reset as `first; second; ...`.
fn format_failures(failures: &[SharedResourceError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the shared resource cache and its tokens.
///
/// Keys are rendered with their `Debug` representation so the error type
/// stays independent of the cache's key type.
#[derive(Debug, Error)]
pub enum SharedResourceError {
    #[error("Resource creation failed for key {key}: {source}")]
    CreationFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Resource creation for key {key} timed out after {timeout_ms}ms")]
    CreationTimedOut { key: String, timeout_ms: u64 },

    #[error("Resource acquisition cancelled for key {key}")]
    Cancelled { key: String },

    #[error("Resource for key {key} is not valid anymore, get a new one")]
    InvalidatedToken { key: String },

    #[error("Token for key {key} was already released")]
    ReleasedToken { key: String },

    #[error("Resource disposal failed for key {key}: {source}")]
    DisposalFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Reset failed to dispose {} resource(s): {}", .0.len(), format_failures(.0))]
    ResetFailed(Vec<SharedResourceError>),

    #[error("Released token for key {key} has no matching cache entry")]
    UnknownEntry { key: String },

    #[error("Release task for key {key} aborted before completion")]
    ReleaseAborted { key: String },
}

impl SharedResourceError {
    /// Whether this error came out of a resource's dispose operation.
    pub fn is_disposal_failure(&self) -> bool {
        matches!(self, Self::DisposalFailed { .. } | Self::ResetFailed(_))
    }

    /// Whether this error means the resource was never created.
    pub fn is_creation_failure(&self) -> bool {
        matches!(
            self,
            Self::CreationFailed { .. } | Self::CreationTimedOut { .. } | Self::Cancelled { .. }
        )
    }
}

pub type SharedResourceResult<T> = Result<T, SharedResourceError>;
