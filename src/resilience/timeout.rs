use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// Extension trait to add timeout functionality to futures
#[allow(async_fn_in_trait)]
pub trait TimeoutExt<T> {
    /// Add timeout to a future with custom duration
    async fn with_timeout_duration(self, duration: Duration) -> Result<T>;
}

impl<F, T> TimeoutExt<T> for F
where
    F: Future<Output = T>,
{
    async fn with_timeout_duration(self, duration: Duration) -> Result<T> {
        match timeout(duration, self).await {
            Ok(result) => Ok(result),
            Err(_) => Err(Error::Timeout { timeout: duration }),
        }
    }
}

/// Named timeout for one kind of operation, with logging
#[derive(Debug, Clone)]
pub struct TimeoutWrapper {
    operation_name: String,
    timeout: Duration,
}

impl TimeoutWrapper {
    /// Create a new timeout wrapper
    pub fn new(operation_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            operation_name: operation_name.into(),
            timeout,
        }
    }

    /// Configured limit
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute an operation with timeout and logging
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start_time = Instant::now();

        debug!(
            "Starting operation '{}' with timeout {:?}",
            self.operation_name, self.timeout
        );

        match operation().with_timeout_duration(self.timeout).await {
            Ok(Ok(value)) => {
                debug!(
                    "Operation '{}' completed successfully in {:?}",
                    self.operation_name,
                    start_time.elapsed()
                );
                Ok(value)
            }
            Ok(Err(error)) => {
                debug!(
                    "Operation '{}' failed after {:?}: {}",
                    self.operation_name,
                    start_time.elapsed(),
                    error
                );
                Err(error)
            }
            Err(error) => {
                warn!(
                    "Operation '{}' timed out after {:?}",
                    self.operation_name, self.timeout
                );
                Err(error)
            }
        }
    }
}
