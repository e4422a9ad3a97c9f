//! Builder logs: the buffered log stream of the most recent build.

use crate::config::BuilderSource;
use crate::error::{HerogateError, Result};
use crate::provider::{CloudProvider, ProviderError, ProviderResult};
use crate::types::{LogEntry, Process, HEROGATE_SOURCE};
use chrono::{TimeZone, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Pipeline stage whose action runs the build.
const BUILD_STAGE: &str = "Build";

/// Fetch all entries of the latest build. No build yet means no entries.
pub async fn fetch(
    provider: &dyn CloudProvider,
    app: &str,
    source: BuilderSource,
) -> Result<Vec<LogEntry>> {
    let (build_id, operation) = match source {
        BuilderSource::Builds => (latest_build(provider, app).await, "list_builds"),
        BuilderSource::Pipeline => {
            (latest_pipeline_build(provider, app).await, "describe_pipeline_state")
        }
    };
    let Some(build_id) = absent_as_none(build_id, app, operation)?.flatten() else {
        debug!(app = %app, "No build yet");
        return Ok(Vec::new());
    };

    let build = provider.describe_build(&build_id).await;
    let Some(build) = absent_as_none(build, app, "describe_build")? else {
        return Ok(Vec::new());
    };
    let (Some(group), Some(stream)) = (build.log_group, build.log_stream) else {
        debug!(app = %app, build_id = %build_id, "Build has no log stream yet");
        return Ok(Vec::new());
    };

    let events = provider.get_log_events(&group, &stream).await;
    let Some(events) = absent_as_none(events, app, "get_log_events")? else {
        return Ok(Vec::new());
    };

    events
        .into_iter()
        .map(|event| {
            let millis = event.timestamp_millis;
            let timestamp = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                HerogateError::malformed(
                    format!("log stream {}/{}", group, stream),
                    format!("invalid event timestamp {}", millis),
                )
            })?;

            Ok(LogEntry {
                id: entry_id(&build_id, event.timestamp_millis, &event.message),
                timestamp,
                source: HEROGATE_SOURCE.to_string(),
                process: Process::Builder,
                message: event.message.trim_end_matches('\n').to_string(),
            })
        })
        .collect()
}

/// Stable id of a build log event. Build streams are immutable, so repeated
/// fetches yield the same ids.
pub fn entry_id(build_id: &str, timestamp_millis: i64, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(build_id.as_bytes());
    hasher.update(timestamp_millis.to_be_bytes());
    hasher.update(message.as_bytes());
    format!("{:x}", hasher.finalize())
}

async fn latest_build(provider: &dyn CloudProvider, app: &str) -> ProviderResult<Option<String>> {
    Ok(provider.list_builds(app).await?.into_iter().next())
}

/// Legacy path: the build started by the `Build` stage of the latest pipeline execution.
async fn latest_pipeline_build(
    provider: &dyn CloudProvider,
    app: &str,
) -> ProviderResult<Option<String>> {
    let Some(execution) = provider.list_pipeline_executions(app).await?.into_iter().next() else {
        return Ok(None);
    };

    let stages = provider.describe_pipeline_state(app).await?;
    Ok(stages
        .into_iter()
        .find(|stage| stage.stage_name == BUILD_STAGE)
        .filter(|stage| stage.execution_id.as_deref() == Some(execution.id.as_str()))
        .and_then(|stage| stage.external_execution_id))
}

/// Missing dependent resources are an empty result, anything else is fatal.
fn absent_as_none<T>(
    result: ProviderResult<T>,
    app: &str,
    operation: &'static str,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_absent() => {
            debug!(app = %app, error = %e, "Builder resource not available yet");
            Ok(None)
        }
        Err(ProviderError::Malformed { operation: op, reason }) => {
            Err(HerogateError::malformed(format!("{} response for {}", op, app), reason))
        }
        Err(e) => Err(HerogateError::upstream(operation, app, e)),
    }
}
