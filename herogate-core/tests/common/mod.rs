//! Scripted in-memory cloud provider shared by the integration tests.
//!
//! Stack operations converge instantly to the scripted outcome. Every call is
//! recorded as `operation:argument` so tests can assert ordering.

#![allow(dead_code)]

use async_trait::async_trait;
use herogate_core::provider::blueprint::{
    ARTIFACT_STORE_RESOURCE, ENDPOINT_OUTPUT, PLATFORM_VERSION_TAG, REGISTRY_RESOURCE,
    REPOSITORY_OUTPUT,
};
use herogate_core::provider::{
    BuildRecord, CloudProvider, CreateStackRequest, LogEvent, PipelineExecution, ProviderError,
    ProviderResult, ServiceDescription, StackDescription, StackResource, StageState,
    TaskDefinition, UpdateStackRequest,
};
use herogate_core::{Blueprint, StackStatus};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

pub const APP: &str = "young-eyrie-24091";

/// Mutable world of the fake provider.
pub struct FakeState {
    pub stacks: BTreeMap<String, StackDescription>,
    pub templates: BTreeMap<String, String>,
    pub resources: BTreeMap<String, Vec<StackResource>>,
    pub buckets: BTreeMap<String, Vec<String>>,
    /// Repository name to number of images
    pub repositories: BTreeMap<String, usize>,
    pub clusters: BTreeSet<String>,
    pub services: BTreeMap<String, ServiceDescription>,
    pub task_definitions: BTreeMap<String, TaskDefinition>,
    pub builds: BTreeMap<String, Vec<String>>,
    pub build_records: BTreeMap<String, BuildRecord>,
    pub log_events: BTreeMap<(String, String), Vec<LogEvent>>,
    pub pipeline_executions: BTreeMap<String, Vec<PipelineExecution>>,
    pub stage_states: BTreeMap<String, Vec<StageState>>,

    /// Status a created stack settles in
    pub create_outcome: StackStatus,
    /// Resources a created stack reports
    pub create_resources: Vec<StackResource>,
    /// Status an updated stack settles in
    pub update_outcome: StackStatus,
    /// Status a deleted stack settles in; `None` removes it
    pub delete_outcome: Option<StackStatus>,
    pub fail_delete_bucket: bool,
    /// `describe_service` answers with an unreadable response
    pub malformed_service: bool,

    pub created: Vec<CreateStackRequest>,
    pub updated: Vec<UpdateStackRequest>,
    pub calls: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            stacks: BTreeMap::new(),
            templates: BTreeMap::new(),
            resources: BTreeMap::new(),
            buckets: BTreeMap::new(),
            repositories: BTreeMap::new(),
            clusters: BTreeSet::new(),
            services: BTreeMap::new(),
            task_definitions: BTreeMap::new(),
            builds: BTreeMap::new(),
            build_records: BTreeMap::new(),
            log_events: BTreeMap::new(),
            pipeline_executions: BTreeMap::new(),
            stage_states: BTreeMap::new(),
            create_outcome: StackStatus::CreateComplete,
            create_resources: Vec::new(),
            update_outcome: StackStatus::UpdateComplete,
            delete_outcome: None,
            fail_delete_bucket: false,
            malformed_service: false,
            created: Vec::new(),
            updated: Vec::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Position of the first call starting with `prefix`.
    pub fn call_index(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    /// Install a fully created application with its bucket and registry.
    pub fn install_app(&self, name: &str, template: &str) {
        let mut state = self.state();
        state.stacks.insert(name.to_string(), app_stack(name, StackStatus::CreateComplete));
        state.templates.insert(name.to_string(), template.to_string());

        let bucket = format!("{}-artifacts", name);
        let repository = format!("{}-registry", name);
        state.resources.insert(
            name.to_string(),
            vec![
                resource(ARTIFACT_STORE_RESOURCE, Some(&bucket), StackStatus::CreateComplete),
                resource(REGISTRY_RESOURCE, Some(&repository), StackStatus::CreateComplete),
            ],
        );
        state.buckets.insert(bucket, Vec::new());
        state.repositories.insert(repository, 0);
    }

    fn record(&self, call: String) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

pub fn app_stack(name: &str, status: StackStatus) -> StackDescription {
    StackDescription {
        name: name.to_string(),
        status,
        outputs: BTreeMap::from([
            (
                REPOSITORY_OUTPUT.to_string(),
                format!("ssh://git-codecommit.us-east-1.amazonaws.com/v1/repos/{}", name),
            ),
            (ENDPOINT_OUTPUT.to_string(), format!("{}-123.us-east-1.elb.amazonaws.com", name)),
        ]),
        tags: BTreeMap::from([(PLATFORM_VERSION_TAG.to_string(), "1.0".to_string())]),
    }
}

pub fn resource(logical_id: &str, physical_id: Option<&str>, status: StackStatus) -> StackResource {
    StackResource {
        logical_id: logical_id.to_string(),
        physical_id: physical_id.map(str::to_string),
        resource_type: "AWS::CloudFormation::CustomResource".to_string(),
        status,
    }
}

/// Blueprint body declaring `count` resources.
pub fn blueprint(count: usize) -> Blueprint {
    let mut body = String::from("Description: Herogate Platform Template v1.0\nResources:\n");
    for i in 0..count {
        body.push_str(&format!("  Resource{}:\n    Type: AWS::SNS::Topic\n", i));
    }
    Blueprint::new("1.0", body).unwrap()
}

fn stack_not_found(name: &str) -> ProviderError {
    ProviderError::StackNotFound { stack: name.to_string() }
}

fn not_found(kind: &'static str, name: &str) -> ProviderError {
    ProviderError::ResourceNotFound { kind, name: name.to_string() }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    async fn create_stack(&self, request: &CreateStackRequest) -> ProviderResult<()> {
        let mut state = self.record(format!("create_stack:{}", request.name));
        let mut stack = app_stack(&request.name, state.create_outcome.clone());
        stack.tags = request.tags.clone();

        state.stacks.insert(request.name.clone(), stack);
        state.templates.insert(request.name.clone(), request.template_body.clone());
        let resources = state.create_resources.clone();
        state.resources.insert(request.name.clone(), resources);
        state.created.push(request.clone());
        Ok(())
    }

    async fn describe_stack(&self, name: &str) -> ProviderResult<StackDescription> {
        let state = self.record(format!("describe_stack:{}", name));
        state.stacks.get(name).cloned().ok_or_else(|| stack_not_found(name))
    }

    async fn list_stacks(&self) -> ProviderResult<Vec<StackDescription>> {
        let state = self.record("list_stacks".to_string());
        Ok(state.stacks.values().cloned().collect())
    }

    async fn update_stack(&self, request: &UpdateStackRequest) -> ProviderResult<()> {
        let mut state = self.record(format!("update_stack:{}", request.name));
        let outcome = state.update_outcome.clone();
        let stack =
            state.stacks.get_mut(&request.name).ok_or_else(|| stack_not_found(&request.name))?;
        stack.status = outcome;

        state.templates.insert(request.name.clone(), request.template_body.clone());
        state.updated.push(request.clone());
        Ok(())
    }

    async fn delete_stack(&self, name: &str) -> ProviderResult<()> {
        let mut state = self.record(format!("delete_stack:{}", name));
        if !state.stacks.contains_key(name) {
            return Err(stack_not_found(name));
        }

        match state.delete_outcome.clone() {
            Some(status) => {
                if let Some(stack) = state.stacks.get_mut(name) {
                    stack.status = status;
                }
            }
            None => {
                state.stacks.remove(name);
                state.resources.remove(name);
            }
        }
        Ok(())
    }

    async fn get_template(&self, name: &str) -> ProviderResult<String> {
        let state = self.record(format!("get_template:{}", name));
        state.templates.get(name).cloned().ok_or_else(|| stack_not_found(name))
    }

    async fn list_stack_resources(&self, name: &str) -> ProviderResult<Vec<StackResource>> {
        let state = self.record(format!("list_stack_resources:{}", name));
        if !state.stacks.contains_key(name) {
            return Err(stack_not_found(name));
        }
        Ok(state.resources.get(name).cloned().unwrap_or_default())
    }

    async fn describe_stack_resource(
        &self,
        name: &str,
        logical_id: &str,
    ) -> ProviderResult<StackResource> {
        let state = self.record(format!("describe_stack_resource:{}", logical_id));
        state
            .resources
            .get(name)
            .and_then(|resources| resources.iter().find(|r| r.logical_id == logical_id))
            .cloned()
            .ok_or_else(|| not_found("Stack resource", logical_id))
    }

    async fn list_objects(&self, bucket: &str) -> ProviderResult<Vec<String>> {
        let state = self.record(format!("list_objects:{}", bucket));
        state.buckets.get(bucket).cloned().ok_or_else(|| not_found("Bucket", bucket))
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ProviderResult<()> {
        let mut state = self.record(format!("delete_objects:{}:{}", bucket, keys.len()));
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| not_found("Bucket", bucket))?;
        objects.retain(|key| !keys.contains(key));
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> ProviderResult<()> {
        let mut state = self.record(format!("delete_bucket:{}", bucket));
        if state.fail_delete_bucket {
            return Err(ProviderError::Rejected {
                operation: "DeleteBucket".to_string(),
                message: "Access Denied".to_string(),
            });
        }
        match state.buckets.get(bucket).map(Vec::len) {
            None => Err(not_found("Bucket", bucket)),
            Some(objects) if objects > 0 => Err(ProviderError::Rejected {
                operation: "DeleteBucket".to_string(),
                message: "BucketNotEmpty".to_string(),
            }),
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn force_delete_repository(&self, repository: &str) -> ProviderResult<()> {
        let mut state = self.record(format!("force_delete_repository:{}", repository));
        state
            .repositories
            .remove(repository)
            .map(|_| ())
            .ok_or_else(|| not_found("Repository", repository))
    }

    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> ProviderResult<Option<ServiceDescription>> {
        let state = self.record(format!("describe_service:{}", service));
        if state.malformed_service {
            return Err(ProviderError::Malformed {
                operation: "DescribeServices".to_string(),
                reason: "event without createdAt".to_string(),
            });
        }
        if !state.clusters.contains(cluster) {
            return Err(ProviderError::ClusterNotFound { cluster: cluster.to_string() });
        }
        Ok(state.services.get(service).cloned())
    }

    async fn describe_task_definition(&self, arn: &str) -> ProviderResult<TaskDefinition> {
        let state = self.record(format!("describe_task_definition:{}", arn));
        state.task_definitions.get(arn).cloned().ok_or_else(|| not_found("Task definition", arn))
    }

    async fn list_builds(&self, project: &str) -> ProviderResult<Vec<String>> {
        let state = self.record(format!("list_builds:{}", project));
        state.builds.get(project).cloned().ok_or_else(|| not_found("Build project", project))
    }

    async fn describe_build(&self, build_id: &str) -> ProviderResult<BuildRecord> {
        let state = self.record(format!("describe_build:{}", build_id));
        state.build_records.get(build_id).cloned().ok_or_else(|| not_found("Build", build_id))
    }

    async fn get_log_events(&self, group: &str, stream: &str) -> ProviderResult<Vec<LogEvent>> {
        let state = self.record(format!("get_log_events:{}/{}", group, stream));
        state
            .log_events
            .get(&(group.to_string(), stream.to_string()))
            .cloned()
            .ok_or_else(|| not_found("Log stream", stream))
    }

    async fn list_pipeline_executions(
        &self,
        pipeline: &str,
    ) -> ProviderResult<Vec<PipelineExecution>> {
        let state = self.record(format!("list_pipeline_executions:{}", pipeline));
        state
            .pipeline_executions
            .get(pipeline)
            .cloned()
            .ok_or_else(|| not_found("Pipeline", pipeline))
    }

    async fn describe_pipeline_state(&self, pipeline: &str) -> ProviderResult<Vec<StageState>> {
        let state = self.record(format!("describe_pipeline_state:{}", pipeline));
        state.stage_states.get(pipeline).cloned().ok_or_else(|| not_found("Pipeline", pipeline))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
