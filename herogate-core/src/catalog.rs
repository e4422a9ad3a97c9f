//! Read-side queries over applications.

use crate::error::{HerogateError, Result};
use crate::provider::CloudProvider;
use crate::types::{AppInfo, Application, Container, StackStatus};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves applications from the provider's stacks.
#[derive(Clone)]
pub struct AppCatalog {
    provider: Arc<dyn CloudProvider>,
    region: String,
}

impl AppCatalog {
    pub fn new(provider: Arc<dyn CloudProvider>, region: impl Into<String>) -> Self {
        Self { provider, region: region.into() }
    }

    /// Get an application by name.
    ///
    /// Stacks without the platform tag are not applications and resolve to `AppNotFound`.
    #[instrument(skip(self))]
    pub async fn get_app(&self, name: &str) -> Result<Application> {
        let stack = match self.provider.describe_stack(name).await {
            Ok(stack) => stack,
            Err(e) if e.is_stack_not_found() => {
                return Err(HerogateError::AppNotFound { app: name.to_string() });
            }
            Err(e) => return Err(HerogateError::upstream("describe_stack", name, e)),
        };

        Application::from_stack(&stack)
            .ok_or_else(|| HerogateError::AppNotFound { app: name.to_string() })
    }

    /// List all applications.
    #[instrument(skip(self))]
    pub async fn list_apps(&self) -> Result<Vec<Application>> {
        let stacks = self
            .provider
            .list_stacks()
            .await
            .map_err(|e| HerogateError::upstream("list_stacks", "*", e))?;

        let apps: Vec<Application> = stacks
            .iter()
            .filter(|stack| stack.status != StackStatus::DeleteComplete)
            .filter_map(Application::from_stack)
            .collect();

        debug!(stacks = stacks.len(), apps = apps.len(), "Listed applications");
        Ok(apps)
    }

    /// Whether any live stack (application or not) carries this name.
    pub async fn stack_exists(&self, name: &str) -> Result<bool> {
        match self.provider.describe_stack(name).await {
            Ok(stack) => Ok(stack.status != StackStatus::DeleteComplete),
            Err(e) if e.is_stack_not_found() => Ok(false),
            Err(e) => Err(HerogateError::upstream("describe_stack", name, e)),
        }
    }

    /// Application details with its running containers.
    ///
    /// The service only exists once the first deploy happened; until then the
    /// container list is empty.
    #[instrument(skip(self))]
    pub async fn app_info(&self, name: &str) -> Result<AppInfo> {
        let app = self.get_app(name).await?;

        let service = match self.provider.describe_service(name, name).await {
            Ok(service) => service,
            Err(e) if e.is_absent() => None,
            Err(e) => return Err(HerogateError::upstream("describe_service", name, e)),
        };

        let containers = match service {
            Some(service) => {
                let definition = self
                    .provider
                    .describe_task_definition(&service.task_definition)
                    .await
                    .map_err(|e| HerogateError::upstream("describe_task_definition", name, e))?;

                definition
                    .containers
                    .into_iter()
                    .map(|c| Container {
                        name: c.name,
                        running_count: service.running_count,
                        command: c.command,
                    })
                    .collect()
            }
            None => {
                debug!(app = %name, "No service yet");
                Vec::new()
            }
        };

        Ok(AppInfo { app, containers, region: self.region.clone() })
    }

    pub fn provider(&self) -> &Arc<dyn CloudProvider> {
        &self.provider
    }
}
