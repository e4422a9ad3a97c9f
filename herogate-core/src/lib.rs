//! Herogate Core Library
//!
//! Control plane of a Heroku-style platform on AWS: application stack lifecycle,
//! deployment template mutation and unified build/deploy logs. All remote calls go
//! through the [`CloudProvider`] trait.

pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logs;
pub mod observability;
pub mod paths;
pub mod provider;
pub mod template;
pub mod types;

use std::sync::Arc;

// Re-export commonly used items
pub use catalog::AppCatalog;
pub use config::{BuilderSource, Config};
pub use error::{HerogateError, Result};
pub use lifecycle::{LifecycleOptions, LifecyclePhase, ProgressEvent, StackLifecycleManager};
pub use logs::{LogAggregator, TailOptions};
pub use observability::init as init_observability;
pub use provider::{Blueprint, CloudProvider, ProviderError, StackWaiter, WaitOptions};
pub use template::{EnvVar, TemplateDocument, TemplateManager, TemplateMutator};
pub use types::{
    AppInfo, Application, Container, LifecycleState, LogEntry, LogFilter, Process, StackStatus,
};

/// The control-plane managers over one provider.
#[derive(Clone)]
pub struct ControlPlane {
    pub catalog: AppCatalog,
    pub lifecycle: Arc<StackLifecycleManager>,
    pub templates: TemplateManager,
    pub logs: LogAggregator,
}

impl ControlPlane {
    pub fn new(provider: Arc<dyn CloudProvider>, blueprint: Blueprint, config: &Config) -> Self {
        let catalog = AppCatalog::new(Arc::clone(&provider), config.region.clone());
        let waiter = StackWaiter::new(Arc::clone(&provider), WaitOptions::from(config));

        Self {
            lifecycle: Arc::new(StackLifecycleManager::new(
                catalog.clone(),
                blueprint,
                LifecycleOptions::from(config),
            )),
            templates: TemplateManager::new(catalog.clone(), waiter),
            logs: LogAggregator::new(provider, config.builder_source),
            catalog,
        }
    }
}
