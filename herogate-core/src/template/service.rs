//! Config vars and template generation against the live stack.
//!
//! Every mutation is a read-modify-write of the whole template with no version
//! check. A concurrent external update of the same stack between the read and
//! the write is lost.

use super::document::TemplateDocument;
use super::mutator::TemplateMutator;
use super::procfile::Procfile;
use crate::catalog::AppCatalog;
use crate::error::{HerogateError, Result};
use crate::observability::metrics;
use crate::provider::blueprint::CAPABILITY_NAMED_IAM;
use crate::provider::{CloudProvider, StackWaiter, UpdateStackRequest};
use crate::types::StackStatus;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, instrument};

/// Reads and edits an application's deployment template.
#[derive(Clone)]
pub struct TemplateManager {
    provider: Arc<dyn CloudProvider>,
    catalog: AppCatalog,
    waiter: StackWaiter,
}

impl TemplateManager {
    pub fn new(catalog: AppCatalog, waiter: StackWaiter) -> Self {
        Self { provider: Arc::clone(catalog.provider()), catalog, waiter }
    }

    /// Environment of the running task definition's first container.
    #[instrument(skip(self))]
    pub async fn describe_env_vars(&self, app: &str) -> Result<BTreeMap<String, String>> {
        self.catalog.get_app(app).await?;

        let service = match self.provider.describe_service(app, app).await {
            Ok(Some(service)) => service,
            Ok(None) => {
                return Err(HerogateError::TransientAbsence { resource: format!("service {}", app) })
            }
            Err(e) if e.is_absent() => {
                return Err(HerogateError::TransientAbsence { resource: e.to_string() })
            }
            Err(e) => return Err(HerogateError::upstream("describe_service", app, e)),
        };

        let definition = self
            .provider
            .describe_task_definition(&service.task_definition)
            .await
            .map_err(|e| HerogateError::upstream("describe_task_definition", app, e))?;

        let container = definition.containers.into_iter().next().ok_or_else(|| {
            HerogateError::malformed(
                format!("task definition {}", service.task_definition),
                "no container definitions",
            )
        })?;

        Ok(container.environment.into_iter().collect())
    }

    /// Value of a single variable, `None` when unset.
    pub async fn env_var(&self, app: &str, name: &str) -> Result<Option<String>> {
        Ok(self.describe_env_vars(app).await?.remove(name))
    }

    /// Set variables and roll the stack.
    #[instrument(skip(self, vars), fields(count = vars.len()))]
    pub async fn set_env_vars(&self, app: &str, vars: &BTreeMap<String, String>) -> Result<()> {
        self.update_template(app, "set_env", |doc| TemplateMutator::set_env_vars(doc, vars)).await
    }

    /// Remove variables and roll the stack.
    #[instrument(skip(self))]
    pub async fn unset_env_vars(&self, app: &str, names: &BTreeSet<String>) -> Result<()> {
        self.update_template(app, "unset_env", |doc| TemplateMutator::unset_env_vars(doc, names))
            .await
    }

    /// Render the application template with container definitions generated from a
    /// Procfile. Nothing is submitted.
    #[instrument(skip(self, procfile))]
    pub async fn generate_template(
        &self,
        app: &str,
        image: &str,
        procfile: &str,
    ) -> Result<String> {
        let processes = Procfile::parse(procfile)?;
        let mut doc = self.fetch_template(app).await?;
        TemplateMutator::regenerate_container_definitions(&mut doc, image, &processes)?;
        doc.render()
    }

    /// Parse `NAME=value` arguments. The value may itself contain `=`.
    pub fn parse_env_assignments<S: AsRef<str>>(args: &[S]) -> Result<BTreeMap<String, String>> {
        args.iter()
            .map(|arg| {
                let arg = arg.as_ref();
                match arg.split_once('=') {
                    Some((name, value)) if !name.is_empty() => {
                        Ok((name.to_string(), value.to_string()))
                    }
                    _ => Err(HerogateError::InvalidEnvAssignment { arg: arg.to_string() }),
                }
            })
            .collect()
    }

    async fn fetch_template(&self, app: &str) -> Result<TemplateDocument> {
        self.catalog.get_app(app).await?;
        let body = self
            .provider
            .get_template(app)
            .await
            .map_err(|e| HerogateError::upstream("get_template", app, e))?;
        TemplateDocument::parse(&body)
    }

    async fn update_template<F>(&self, app: &str, kind: &'static str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut TemplateDocument) -> Result<()>,
    {
        let mut doc = self.fetch_template(app).await?;
        let original = doc.clone();
        mutate(&mut doc)?;

        if doc == original {
            info!(app = %app, "Template unchanged, skipping update");
            return Ok(());
        }

        let request = UpdateStackRequest {
            name: app.to_string(),
            template_body: doc.render()?,
            capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
        };

        let started = Instant::now();
        self.provider
            .update_stack(&request)
            .await
            .map_err(|e| HerogateError::upstream("update_stack", app, e))?;
        metrics::record_template_mutation(kind);
        info!(app = %app, kind, "Template submitted, waiting for update");

        let status = self.waiter.wait_until_settled(app, "update_stack").await?;
        metrics::record_stack_operation("update", started.elapsed().as_secs_f64());

        match status {
            Some(StackStatus::UpdateComplete) => {
                info!(app = %app, "Stack updated");
                Ok(())
            }
            Some(status) => {
                metrics::record_stack_failure("update");
                Err(HerogateError::StackUpdateFailed { app: app.to_string(), status })
            }
            None => Err(HerogateError::AppNotFound { app: app.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_assignments() {
        let vars =
            TemplateManager::parse_env_assignments(&["FOO=bar", "URL=postgres://u:p@h/db?x=1"])
                .unwrap();
        assert_eq!(vars["FOO"], "bar");
        assert_eq!(vars["URL"], "postgres://u:p@h/db?x=1");

        let empty = TemplateManager::parse_env_assignments(&["EMPTY="]).unwrap();
        assert_eq!(empty["EMPTY"], "");
    }

    #[test]
    fn test_parse_env_assignments_rejects_missing_separator() {
        let err = TemplateManager::parse_env_assignments(&["FOO=bar", "INVALID"]).unwrap_err();
        assert_eq!(err.to_string(), "INVALID is invalid. Must be in the format FOO=bar.");

        assert!(TemplateManager::parse_env_assignments(&["=bar"]).is_err());
    }
}
