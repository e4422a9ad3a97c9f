//! Application domain types.

use crate::error::{HerogateError, Result};
use crate::provider::blueprint::{ENDPOINT_OUTPUT, PLATFORM_VERSION_TAG, REPOSITORY_OUTPUT};
use crate::provider::StackDescription;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static APP_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z-0-9_\-]+[a-z0-9]$").expect("Invalid app name regex")
});

/// Check an application name against the naming rule shared with the stack name.
pub fn validate_app_name(name: &str) -> Result<()> {
    if APP_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(HerogateError::InvalidAppName { name: name.to_string() })
    }
}

/// Status of a stack (or of a single stack resource), as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StackStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    ReviewInProgress,
    /// A status this client does not know about.
    Other(String),
}

impl StackStatus {
    /// Provider wire representation (e.g. `CREATE_COMPLETE`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::Other(s) => s,
        }
    }

    /// Parse the provider wire representation. Unknown values are kept verbatim.
    pub fn parse(s: &str) -> Self {
        match s {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => Self::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => Self::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => Self::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                Self::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => Self::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => Self::ReviewInProgress,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the provider has stopped working on the stack.
    pub fn is_terminal(&self) -> bool {
        !self.as_str().ends_with("_IN_PROGRESS")
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for StackStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<StackStatus> for String {
    fn from(status: StackStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Position of an application in the stack lifecycle.
///
/// `NotExists -> Creating -> {Created, Failed -> Deleting}; Created -> Deleting -> NotExists`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotExists,
    Creating,
    Created,
    Failed,
    Deleting,
}

impl LifecycleState {
    /// Derive the lifecycle state from the stack status (`None` when no stack exists).
    pub fn from_status(status: Option<&StackStatus>) -> Self {
        let Some(status) = status else {
            return Self::NotExists;
        };

        match status {
            StackStatus::CreateInProgress | StackStatus::ReviewInProgress => Self::Creating,
            StackStatus::DeleteInProgress => Self::Deleting,
            StackStatus::DeleteComplete => Self::NotExists,
            StackStatus::CreateFailed
            | StackStatus::RollbackInProgress
            | StackStatus::RollbackFailed
            | StackStatus::RollbackComplete
            | StackStatus::DeleteFailed => Self::Failed,
            _ => Self::Created,
        }
    }
}

/// Herogate application. This is a read view of the application's stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    name: String,

    /// Current stack status
    pub status: StackStatus,

    /// Git remote the builder pulls from
    pub repository_url: String,

    /// Public endpoint (with scheme), empty until the load balancer exists
    pub endpoint_url: String,

    /// Blueprint version the stack was created from
    pub platform_version: String,
}

impl Application {
    /// Build the application view of a stack.
    ///
    /// Returns `None` for stacks that were not created by Herogate (no platform tag).
    pub fn from_stack(stack: &StackDescription) -> Option<Self> {
        let platform_version = stack.tags.get(PLATFORM_VERSION_TAG).filter(|v| !v.is_empty())?;

        // The load balancer DNS name comes without a scheme
        let endpoint_url = stack
            .outputs
            .get(ENDPOINT_OUTPUT)
            .map(|dns| format!("http://{}", dns))
            .unwrap_or_default();

        Some(Self {
            name: stack.name.clone(),
            status: stack.status.clone(),
            repository_url: stack.outputs.get(REPOSITORY_OUTPUT).cloned().unwrap_or_default(),
            endpoint_url,
            platform_version: platform_version.clone(),
        })
    }

    /// Application name. Fixed for the lifetime of the application.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Running container of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub running_count: u32,
    pub command: Vec<String>,
}

/// Application details including its running containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app: Application,
    pub containers: Vec<Container>,
    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(tags: &[(&str, &str)], outputs: &[(&str, &str)]) -> StackDescription {
        StackDescription {
            name: "young-eyrie-24091".to_string(),
            status: StackStatus::CreateComplete,
            outputs: outputs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn test_validate_app_name() {
        assert!(validate_app_name("young-eyrie-24091").is_ok());
        assert!(validate_app_name("app_1").is_ok());
        assert!(validate_app_name("Invalid").is_err());
        assert!(validate_app_name("-leading").is_err());
        assert!(validate_app_name("trailing-").is_err());
        assert!(validate_app_name("ab").is_err());
    }

    #[test]
    fn test_status_round_trip_and_terminal() {
        let status = StackStatus::parse("UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS");
        assert_eq!(status, StackStatus::UpdateRollbackCompleteCleanupInProgress);
        assert!(!status.is_terminal());

        assert!(StackStatus::CreateComplete.is_terminal());
        assert!(StackStatus::RollbackComplete.is_terminal());
        assert!(!StackStatus::DeleteInProgress.is_terminal());

        let unknown = StackStatus::parse("IMPORT_IN_PROGRESS");
        assert_eq!(unknown, StackStatus::Other("IMPORT_IN_PROGRESS".to_string()));
        assert!(!unknown.is_terminal());
        assert_eq!(unknown.to_string(), "IMPORT_IN_PROGRESS");
    }

    #[test]
    fn test_lifecycle_state_from_status() {
        assert_eq!(LifecycleState::from_status(None), LifecycleState::NotExists);
        assert_eq!(
            LifecycleState::from_status(Some(&StackStatus::CreateInProgress)),
            LifecycleState::Creating
        );
        assert_eq!(
            LifecycleState::from_status(Some(&StackStatus::UpdateComplete)),
            LifecycleState::Created
        );
        assert_eq!(
            LifecycleState::from_status(Some(&StackStatus::RollbackComplete)),
            LifecycleState::Failed
        );
        assert_eq!(
            LifecycleState::from_status(Some(&StackStatus::DeleteInProgress)),
            LifecycleState::Deleting
        );
        assert_eq!(
            LifecycleState::from_status(Some(&StackStatus::DeleteComplete)),
            LifecycleState::NotExists
        );
    }

    #[test]
    fn test_application_from_stack() {
        let app = Application::from_stack(&stack(
            &[(PLATFORM_VERSION_TAG, "1.0")],
            &[
                (REPOSITORY_OUTPUT, "ssh://git-codecommit.us-east-1.amazonaws.com/v1/repos/x"),
                (ENDPOINT_OUTPUT, "x-123456789.us-east-1.elb.amazonaws.com"),
            ],
        ))
        .unwrap();

        assert_eq!(app.name(), "young-eyrie-24091");
        assert_eq!(app.platform_version, "1.0");
        assert_eq!(app.endpoint_url, "http://x-123456789.us-east-1.elb.amazonaws.com");
        assert_eq!(app.repository_url, "ssh://git-codecommit.us-east-1.amazonaws.com/v1/repos/x");
    }

    #[test]
    fn test_application_from_stack_without_tag() {
        assert!(Application::from_stack(&stack(&[], &[])).is_none());
        assert!(Application::from_stack(&stack(&[(PLATFORM_VERSION_TAG, "")], &[])).is_none());

        let app = Application::from_stack(&stack(&[(PLATFORM_VERSION_TAG, "1.0")], &[])).unwrap();
        assert_eq!(app.endpoint_url, "");
        assert_eq!(app.repository_url, "");
    }
}
