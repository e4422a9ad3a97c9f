//! Error types for Herogate.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.
//! Provider failures are wrapped in [`HerogateError::Upstream`] with the failing
//! operation and application attached, so callers can always tell which call broke.

use crate::provider::{ProviderError, StackResource};
use crate::types::StackStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Herogate operations.
pub type Result<T> = std::result::Result<T, HerogateError>;

/// Main error type for Herogate.
#[derive(Error, Debug)]
pub enum HerogateError {
    // Application errors
    #[error("Couldn't find that app: {app}")]
    AppNotFound { app: String },

    #[error("Name is already taken: {app}")]
    AppAlreadyExists { app: String },

    #[error("Invalid application name {name:?}: must match `^[a-z0-9][a-z-0-9_\\-]+[a-z0-9]$`")]
    InvalidAppName { name: String },

    /// A dependent sub-resource is not there yet. Log fetches swallow this;
    /// it only escapes from operations that cannot proceed without the resource.
    #[error("{resource} is not available yet")]
    TransientAbsence { resource: String },

    // Structural errors
    #[error("Malformed state at {context}: {reason}")]
    MalformedState { context: String, reason: String },

    // Provider errors
    #[error("{operation} failed for {app}: {source}")]
    Upstream {
        operation: &'static str,
        app: String,
        #[source]
        source: ProviderError,
    },

    #[error("Stack creation failed for {app} ({status}); {} partial resources", resources.len())]
    StackCreationFailed { app: String, status: StackStatus, resources: Vec<StackResource> },

    #[error("Stack deletion failed for {app} ({status}); {} resources remain", resources.len())]
    StackDeletionFailed { app: String, status: StackStatus, resources: Vec<StackResource> },

    #[error("Stack update failed for {app} ({status})")]
    StackUpdateFailed { app: String, status: StackStatus },

    #[error("Timed out after {waited_secs}s waiting for {operation} of {app}")]
    WaitTimeout { app: String, operation: &'static str, waited_secs: u64 },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    // Input errors
    #[error("{arg} is invalid. Must be in the format FOO=bar.")]
    InvalidEnvAssignment { arg: String },

    #[error("Invalid blueprint: {reason}")]
    InvalidBlueprint { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HerogateError {
    /// Wrap a provider failure for `operation` against `app`, counting it.
    pub fn upstream(
        operation: &'static str,
        app: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        crate::observability::metrics::record_provider_error(operation);
        Self::Upstream { operation, app: app.into(), source }
    }

    /// Create a MalformedState error with the offending location attached.
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedState { context: context.into(), reason: reason.into() }
    }

    /// Whether this error reports a missing application.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AppNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_keeps_source_chain() {
        let err = HerogateError::upstream(
            "delete_stack",
            "young-eyrie-24091",
            ProviderError::Rejected {
                operation: "DeleteStack".to_string(),
                message: "access denied".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "delete_stack failed for young-eyrie-24091: DeleteStack rejected: access denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_creation_failure_reports_resource_count() {
        let err = HerogateError::StackCreationFailed {
            app: "demo".to_string(),
            status: StackStatus::RollbackComplete,
            resources: vec![StackResource {
                logical_id: "HerogateRegistry".to_string(),
                physical_id: None,
                resource_type: "AWS::ECR::Repository".to_string(),
                status: StackStatus::CreateFailed,
            }],
        };

        assert_eq!(
            err.to_string(),
            "Stack creation failed for demo (ROLLBACK_COMPLETE); 1 partial resources"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(HerogateError::AppNotFound { app: "x".to_string() }.is_not_found());
        assert!(!HerogateError::Internal("x".to_string()).is_not_found());
    }
}
