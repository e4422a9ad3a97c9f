//! Cloud provider abstraction.
//!
//! Herogate never talks to a cloud SDK directly. Every remote operation goes through
//! the `CloudProvider` trait, which returns typed records or a typed [`ProviderError`].
//! SDK wrappers implement the trait; tests implement it with scripted fakes.

use crate::types::StackStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub mod blueprint;
pub mod waiter;

pub use blueprint::Blueprint;
pub use waiter::{StackWaiter, WaitOptions};

/// Result type alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Typed provider failure.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Stack not found: {stack}")]
    StackNotFound { stack: String },

    #[error("{kind} not found: {name}")]
    ResourceNotFound { kind: &'static str, name: String },

    #[error("Cluster not found: {cluster}")]
    ClusterNotFound { cluster: String },

    #[error("Service not found: {service}")]
    ServiceNotFound { service: String },

    #[error("{operation} rejected: {message}")]
    Rejected { operation: String, message: String },

    #[error("Malformed {operation} response: {reason}")]
    Malformed { operation: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// The stack itself is gone.
    pub fn is_stack_not_found(&self) -> bool {
        matches!(self, Self::StackNotFound { .. })
    }

    /// A dependent resource (cluster, service, build project, log stream) is missing.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotFound { .. }
                | Self::ClusterNotFound { .. }
                | Self::ServiceNotFound { .. }
        )
    }
}

/// Request to provision a new stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStackRequest {
    pub name: String,
    pub template_body: String,
    pub timeout: Duration,
    pub capabilities: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

/// Request to replace a stack's template wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStackRequest {
    pub name: String,
    pub template_body: String,
    pub capabilities: Vec<String>,
}

/// Stack as described by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    pub status: StackStatus,
    pub outputs: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

/// Resource belonging to a stack, with its own status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResource {
    pub logical_id: String,
    pub physical_id: Option<String>,
    pub resource_type: String,
    pub status: StackStatus,
}

/// Running service of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    pub name: String,
    pub running_count: u32,
    pub task_definition: String,
    /// Bounded recent-event history kept by the provider, in provider order.
    pub events: Vec<ServiceEvent>,
}

/// Lifecycle event reported by the deployer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

/// Task definition the service is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub arn: String,
    pub containers: Vec<ContainerSpec>,
}

/// Container as declared in a live task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub command: Vec<String>,
    pub environment: Vec<(String, String)>,
}

/// Build record of the builder project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub id: String,
    pub log_group: Option<String>,
    pub log_stream: Option<String>,
}

/// Buffered event of a log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp_millis: i64,
    pub message: String,
}

/// Execution of the delivery pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExecution {
    pub id: String,
    pub status: String,
}

/// Latest state of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageState {
    pub stage_name: String,
    pub execution_id: Option<String>,
    /// External id of the stage's first action (the build id for the `Build` stage)
    pub external_execution_id: Option<String>,
}

/// Cloud provider trait.
///
/// All remote integrations must implement this trait. Calls are single attempts:
/// implementations must not retry, Herogate only ever waits for convergence by polling.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    // Stacks
    async fn create_stack(&self, request: &CreateStackRequest) -> ProviderResult<()>;
    async fn describe_stack(&self, name: &str) -> ProviderResult<StackDescription>;
    async fn list_stacks(&self) -> ProviderResult<Vec<StackDescription>>;
    async fn update_stack(&self, request: &UpdateStackRequest) -> ProviderResult<()>;
    async fn delete_stack(&self, name: &str) -> ProviderResult<()>;
    async fn get_template(&self, name: &str) -> ProviderResult<String>;
    async fn list_stack_resources(&self, name: &str) -> ProviderResult<Vec<StackResource>>;
    async fn describe_stack_resource(
        &self,
        name: &str,
        logical_id: &str,
    ) -> ProviderResult<StackResource>;

    // Object storage
    async fn list_objects(&self, bucket: &str) -> ProviderResult<Vec<String>>;
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ProviderResult<()>;
    async fn delete_bucket(&self, bucket: &str) -> ProviderResult<()>;

    // Container registry
    async fn force_delete_repository(&self, repository: &str) -> ProviderResult<()>;

    // Container service
    /// Returns `None` when the cluster answers but lists no such service.
    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> ProviderResult<Option<ServiceDescription>>;
    async fn describe_task_definition(&self, arn: &str) -> ProviderResult<TaskDefinition>;

    // Builder
    /// Build ids of a project, most recent first.
    async fn list_builds(&self, project: &str) -> ProviderResult<Vec<String>>;
    async fn describe_build(&self, build_id: &str) -> ProviderResult<BuildRecord>;
    async fn get_log_events(&self, group: &str, stream: &str) -> ProviderResult<Vec<LogEvent>>;

    // Pipeline
    /// Executions of a pipeline, most recent first.
    async fn list_pipeline_executions(
        &self,
        pipeline: &str,
    ) -> ProviderResult<Vec<PipelineExecution>>;
    async fn describe_pipeline_state(&self, pipeline: &str) -> ProviderResult<Vec<StageState>>;

    /// Provider name (for logging).
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ProviderError::StackNotFound { stack: "a".to_string() }.is_stack_not_found());
        assert!(ProviderError::ClusterNotFound { cluster: "a".to_string() }.is_absent());
        assert!(ProviderError::ResourceNotFound { kind: "Build project", name: "a".to_string() }
            .is_absent());
        assert!(!ProviderError::Rejected {
            operation: "UpdateStack".to_string(),
            message: "No updates are to be performed.".to_string()
        }
        .is_absent());
    }

    #[test]
    fn test_other_wraps_anyhow() {
        let err: ProviderError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
    }
}
