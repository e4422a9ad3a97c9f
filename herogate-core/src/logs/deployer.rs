//! Deployer logs: the service's recent-event history.

use crate::error::{HerogateError, Result};
use crate::provider::{CloudProvider, ProviderError};
use crate::types::{LogEntry, Process, HEROGATE_SOURCE};
use tracing::debug;

/// Fetch the service events of an application, oldest first.
///
/// The cluster and the service share the application name. Until both exist the
/// result is empty.
pub async fn fetch(provider: &dyn CloudProvider, app: &str) -> Result<Vec<LogEntry>> {
    let service = match provider.describe_service(app, app).await {
        Ok(Some(service)) => service,
        Ok(None) => {
            debug!(app = %app, "Service not available yet");
            return Ok(Vec::new());
        }
        Err(e) if e.is_absent() => {
            debug!(app = %app, error = %e, "Service not available yet");
            return Ok(Vec::new());
        }
        Err(ProviderError::Malformed { operation, reason }) => {
            let context = format!("{} response for {}", operation, app);
            return Err(HerogateError::malformed(context, reason));
        }
        Err(e) => return Err(HerogateError::upstream("describe_service", app, e)),
    };

    let mut entries: Vec<LogEntry> = service
        .events
        .into_iter()
        .map(|event| LogEntry {
            id: event.id,
            timestamp: event.created_at,
            source: HEROGATE_SOURCE.to_string(),
            process: Process::Deployer,
            message: event.message,
        })
        .collect();

    // The provider reports newest first
    entries.sort_by_key(|entry| entry.timestamp);
    Ok(entries)
}
