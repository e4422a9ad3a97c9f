//! Waiting for a stack to converge.
//!
//! The provider converges asynchronously. The waiter observes it with a bounded
//! sleep-check-repeat loop; a failed describe is never retried.

use super::CloudProvider;
use crate::config::Config;
use crate::error::{HerogateError, Result};
use crate::types::StackStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Polling parameters for [`StackWaiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WaitOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.stack_poll_interval_secs),
            timeout: Duration::from_secs(config.wait_timeout_secs),
        }
    }
}

/// Blocks until a stack reaches a terminal status.
#[derive(Clone)]
pub struct StackWaiter {
    provider: Arc<dyn CloudProvider>,
    options: WaitOptions,
}

impl StackWaiter {
    pub fn new(provider: Arc<dyn CloudProvider>, options: WaitOptions) -> Self {
        Self { provider, options }
    }

    /// Wait until the stack settles.
    ///
    /// Returns the terminal status, or `None` once the stack no longer exists.
    #[instrument(skip(self), fields(provider = %self.provider.name()))]
    pub async fn wait_until_settled(
        &self,
        name: &str,
        operation: &'static str,
    ) -> Result<Option<StackStatus>> {
        let started = Instant::now();

        loop {
            match self.provider.describe_stack(name).await {
                Ok(stack) if stack.status.is_terminal() => {
                    debug!(status = %stack.status, "Stack settled");
                    return Ok(Some(stack.status));
                }
                Ok(stack) => {
                    debug!(status = %stack.status, "Stack still converging");
                }
                Err(e) if e.is_stack_not_found() => {
                    debug!("Stack no longer exists");
                    return Ok(None);
                }
                Err(e) => return Err(HerogateError::upstream(operation, name, e)),
            }

            if started.elapsed() >= self.options.timeout {
                return Err(HerogateError::WaitTimeout {
                    app: name.to_string(),
                    operation,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}
