//! Stack lifecycle: create, destroy, progress and state.
//!
//! A failed create is always compensated by deleting the stack, so no partial
//! infrastructure is left behind. Destroy empties the artifact bucket and the image
//! registry first because the stack cannot delete them while they hold data.

use crate::catalog::AppCatalog;
use crate::config::Config;
use crate::error::{HerogateError, Result};
use crate::observability::metrics;
use crate::provider::blueprint::{
    ARTIFACT_STORE_RESOURCE, CAPABILITY_NAMED_IAM, PLATFORM_VERSION_TAG, REGISTRY_RESOURCE,
};
use crate::provider::{
    Blueprint, CloudProvider, CreateStackRequest, ProviderError, ProviderResult, StackResource,
    StackWaiter, WaitOptions,
};
use crate::types::{validate_app_name, Application, LifecycleState, StackStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

mod progress;

pub use progress::{percent, ProgressEvent, ProgressSender};

/// Phase a progress query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Creating,
    Deleting,
}

impl LifecyclePhase {
    /// Resource status that counts as done in this phase.
    fn done_status(&self) -> StackStatus {
        match self {
            LifecyclePhase::Creating => StackStatus::CreateComplete,
            LifecyclePhase::Deleting => StackStatus::DeleteComplete,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            LifecyclePhase::Creating => "create",
            LifecyclePhase::Deleting => "destroy",
        }
    }
}

/// Timing parameters of the lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// Interval of the progress poller
    pub progress_interval: Duration,
    /// Provider-side timeout of a create request
    pub stack_timeout: Duration,
    pub wait: WaitOptions,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for LifecycleOptions {
    fn from(config: &Config) -> Self {
        Self {
            progress_interval: Duration::from_secs(config.progress_interval_secs),
            stack_timeout: Duration::from_secs(config.stack_timeout_minutes * 60),
            wait: WaitOptions::from(config),
        }
    }
}

/// Drives application stacks through their lifecycle.
pub struct StackLifecycleManager {
    provider: Arc<dyn CloudProvider>,
    blueprint: Blueprint,
    catalog: AppCatalog,
    waiter: StackWaiter,
    options: LifecycleOptions,
}

impl StackLifecycleManager {
    pub fn new(catalog: AppCatalog, blueprint: Blueprint, options: LifecycleOptions) -> Self {
        let provider = Arc::clone(catalog.provider());
        let waiter = StackWaiter::new(Arc::clone(&provider), options.wait);
        Self { provider, blueprint, catalog, waiter, options }
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Create an application stack and block until it is ready.
    #[instrument(skip(self), fields(blueprint = %self.blueprint.version()))]
    pub async fn create(&self, name: &str) -> Result<Application> {
        validate_app_name(name)?;

        match self.catalog.get_app(name).await {
            Ok(_) => return Err(HerogateError::AppAlreadyExists { app: name.to_string() }),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        // Non-application stacks share the namespace
        if self.catalog.stack_exists(name).await? {
            return Err(HerogateError::AppAlreadyExists { app: name.to_string() });
        }

        let request = CreateStackRequest {
            name: name.to_string(),
            template_body: self.blueprint.body().to_string(),
            timeout: self.options.stack_timeout,
            capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
            tags: BTreeMap::from([(
                PLATFORM_VERSION_TAG.to_string(),
                self.blueprint.version().to_string(),
            )]),
        };

        let started = Instant::now();
        info!(app = %name, "Creating stack");
        self.provider
            .create_stack(&request)
            .await
            .map_err(|e| HerogateError::upstream("create_stack", name, e))?;

        let status = self.waiter.wait_until_settled(name, "create_stack").await?;
        metrics::record_stack_operation("create", started.elapsed().as_secs_f64());

        match status {
            Some(StackStatus::CreateComplete) => {
                info!(app = %name, "Stack created");
                self.catalog.get_app(name).await
            }
            Some(status) => Err(self.compensate_failed_create(name, status).await),
            // Rolled back and already gone
            None => Err(self.compensate_failed_create(name, StackStatus::DeleteComplete).await),
        }
    }

    /// Collect diagnostics of a failed create and tear the stack down.
    ///
    /// The compensating delete is issued but not waited for.
    async fn compensate_failed_create(&self, name: &str, status: StackStatus) -> HerogateError {
        error!(app = %name, status = %status, "Stack creation failed, deleting stack");
        metrics::record_stack_failure("create");

        let resources = self.partial_resources(name).await;

        if let Err(e) = self.provider.delete_stack(name).await {
            if !e.is_stack_not_found() {
                warn!(app = %name, error = %e, "Failed to delete stack after failed create");
            }
        }

        HerogateError::StackCreationFailed { app: name.to_string(), status, resources }
    }

    /// Tear down the stack of a create that was cancelled while converging.
    ///
    /// Like the failed-create teardown, the delete is issued but not waited for.
    pub(crate) async fn teardown_cancelled_create(&self, name: &str) {
        metrics::record_stack_failure("create");
        match self.provider.delete_stack(name).await {
            Ok(()) => info!(app = %name, "Deleting stack of cancelled create"),
            // Cancelled before the stack was requested
            Err(e) if e.is_stack_not_found() => {}
            Err(e) => {
                warn!(app = %name, error = %e, "Failed to delete stack after cancelled create")
            }
        }
    }

    async fn partial_resources(&self, name: &str) -> Vec<StackResource> {
        match self.provider.list_stack_resources(name).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(app = %name, error = %e, "Failed to list stack resources");
                Vec::new()
            }
        }
    }

    /// Completion percentage of a create or delete in progress.
    ///
    /// Before the stack appears a create is at 0%; once the stack is gone a delete
    /// is at 100%.
    pub async fn progress(&self, name: &str, phase: LifecyclePhase) -> Result<u8> {
        let resources = match self.provider.list_stack_resources(name).await {
            Ok(resources) => resources,
            Err(e) if e.is_stack_not_found() => {
                return Ok(match phase {
                    LifecyclePhase::Creating => 0,
                    LifecyclePhase::Deleting => 100,
                });
            }
            Err(e) => return Err(HerogateError::upstream("list_stack_resources", name, e)),
        };

        let done = phase.done_status();
        let completed = resources.iter().filter(|r| r.status == done).count();
        Ok(percent(completed, self.blueprint.expected_resources()))
    }

    /// Current lifecycle state of an application stack.
    pub async fn state(&self, name: &str) -> Result<LifecycleState> {
        match self.provider.describe_stack(name).await {
            Ok(stack) => Ok(LifecycleState::from_status(Some(&stack.status))),
            Err(e) if e.is_stack_not_found() => Ok(LifecycleState::NotExists),
            Err(e) => Err(HerogateError::upstream("describe_stack", name, e)),
        }
    }

    /// Tear an application down and block until its stack is gone.
    #[instrument(skip(self))]
    pub async fn destroy(&self, name: &str) -> Result<()> {
        self.catalog.get_app(name).await?;
        let started = Instant::now();

        if let Err(e) = self.empty_artifact_store(name).await {
            warn!(app = %name, error = %e, "Failed to remove artifact store");
        }
        if let Err(e) = self.delete_registry(name).await {
            warn!(app = %name, error = %e, "Failed to remove image registry");
        }

        info!(app = %name, "Deleting stack");
        self.provider
            .delete_stack(name)
            .await
            .map_err(|e| HerogateError::upstream("delete_stack", name, e))?;
        self.waiter.wait_until_settled(name, "delete_stack").await?;
        metrics::record_stack_operation("destroy", started.elapsed().as_secs_f64());

        match self.provider.describe_stack(name).await {
            Err(e) if e.is_stack_not_found() => {}
            Ok(stack) if stack.status == StackStatus::DeleteComplete => {}
            Ok(stack) => {
                error!(app = %name, status = %stack.status, "Stack deletion failed");
                metrics::record_stack_failure("destroy");
                return Err(HerogateError::StackDeletionFailed {
                    app: name.to_string(),
                    status: stack.status,
                    resources: self.partial_resources(name).await,
                });
            }
            Err(e) => return Err(HerogateError::upstream("describe_stack", name, e)),
        }

        info!(app = %name, "Application destroyed");
        Ok(())
    }

    /// Empty the pipeline artifact bucket and delete it.
    async fn empty_artifact_store(&self, name: &str) -> ProviderResult<()> {
        let resource = self.provider.describe_stack_resource(name, ARTIFACT_STORE_RESOURCE).await?;
        let bucket = physical_id(resource)?;

        let keys = self.provider.list_objects(&bucket).await?;
        if !keys.is_empty() {
            info!(app = %name, bucket = %bucket, objects = keys.len(), "Emptying artifact store");
            self.provider.delete_objects(&bucket, &keys).await?;
        }
        self.provider.delete_bucket(&bucket).await
    }

    /// Delete the image registry along with any images it holds.
    async fn delete_registry(&self, name: &str) -> ProviderResult<()> {
        let resource = self.provider.describe_stack_resource(name, REGISTRY_RESOURCE).await?;
        let repository = physical_id(resource)?;

        info!(app = %name, repository = %repository, "Deleting image registry");
        self.provider.force_delete_repository(&repository).await
    }
}

fn physical_id(resource: StackResource) -> ProviderResult<String> {
    resource.physical_id.filter(|id| !id.is_empty()).ok_or(ProviderError::ResourceNotFound {
        kind: "Physical resource",
        name: resource.logical_id,
    })
}
