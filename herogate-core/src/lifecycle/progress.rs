//! Long-running lifecycle operations with progress reporting.
//!
//! The operation runs as a spawned task and hands its result back over a oneshot
//! channel. Meanwhile the caller's task polls progress on a fixed interval.
//! Cancelling a create tears its stack down so no partial stack is left behind.

use super::{LifecyclePhase, StackLifecycleManager};
use crate::error::{HerogateError, Result};
use crate::types::Application;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Progress update of a create or destroy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub app: String,
    pub phase: LifecyclePhase,
    pub percent: u8,
}

pub type ProgressSender = mpsc::Sender<ProgressEvent>;

/// `floor(100 * completed / expected)`, capped at 100.
pub fn percent(completed: usize, expected: usize) -> u8 {
    if expected == 0 {
        return 100;
    }
    (completed.saturating_mul(100) / expected).min(100) as u8
}

impl StackLifecycleManager {
    /// [`create`](Self::create) while publishing progress events.
    pub async fn create_with_progress(
        self: &Arc<Self>,
        name: &str,
        progress_tx: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<Application> {
        let manager = Arc::clone(self);
        let app = name.to_string();
        self.run_with_progress(name, LifecyclePhase::Creating, progress_tx, cancel, async move {
            manager.create(&app).await
        })
        .await
    }

    /// [`destroy`](Self::destroy) while publishing progress events.
    pub async fn destroy_with_progress(
        self: &Arc<Self>,
        name: &str,
        progress_tx: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<()> {
        let manager = Arc::clone(self);
        let app = name.to_string();
        self.run_with_progress(name, LifecyclePhase::Deleting, progress_tx, cancel, async move {
            manager.destroy(&app).await
        })
        .await
    }

    async fn run_with_progress<T, F>(
        &self,
        name: &str,
        phase: LifecyclePhase,
        progress_tx: ProgressSender,
        cancel: CancellationToken,
        operation: F,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (done_tx, mut done_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            // The receiver is gone only if the caller was cancelled
            let _ = done_tx.send(operation.await);
        });

        let mut ticker = tokio::time::interval(self.options.progress_interval);
        loop {
            tokio::select! {
                biased;

                result = &mut done_rx => {
                    let result = result.map_err(|_| {
                        let reason = format!("{} task ended without a result", phase.operation());
                        HerogateError::Internal(reason)
                    })?;
                    if result.is_ok() {
                        Self::send_progress(&progress_tx, name, phase, 100).await;
                    }
                    return result;
                }
                _ = cancel.cancelled() => {
                    warn!(
                        app = %name,
                        operation = phase.operation(),
                        "Cancelled, aborting background task"
                    );
                    task.abort();
                    if phase == LifecyclePhase::Creating {
                        self.teardown_cancelled_create(name).await;
                    }
                    return Err(HerogateError::Cancelled { operation: phase.operation() });
                }
                _ = ticker.tick() => {
                    match self.progress(name, phase).await {
                        Ok(percent) => {
                            Self::send_progress(&progress_tx, name, phase, percent).await
                        }
                        Err(e) => debug!(app = %name, error = %e, "Progress unavailable"),
                    }
                }
            }
        }
    }

    /// Send a progress event. A dropped receiver is ignored.
    async fn send_progress(tx: &ProgressSender, name: &str, phase: LifecyclePhase, percent: u8) {
        let event = ProgressEvent { app: name.to_string(), phase, percent };
        let _ = tx.send(event).await;
    }
}
