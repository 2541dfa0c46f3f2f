//! Async utilities
//!
//! Timeout handling shared by the pipeline stages

use crate::error::{DelverError, DelverResult, ErrorContext};
use tokio::time::{timeout, Duration};

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> DelverResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(DelverError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_suggestion("Increase timeout duration")
                .with_suggestion("Check network connectivity"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_completes_in_time() {
        let result = with_timeout(async { 42 }, 1000, "fast_op").await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            tokio::time::sleep(Duration::from_millis(200)),
            10,
            "slow_op",
        )
        .await;

        match result {
            Err(DelverError::Timeout { operation, .. }) => assert_eq!(operation, "slow_op"),
            _ => panic!("expected timeout error"),
        }
    }
}
