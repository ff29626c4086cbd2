/// Timeout wrapper for async operations
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
}

/// Execute a fallible future with timeout, folding the elapsed case into the
/// caller's own error type.
pub async fn with_timeout_result<F, T, E>(duration: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(E::from(TimeoutError::Elapsed(duration))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum CallError {
        Failed(&'static str),
        TimedOut,
    }

    impl From<TimeoutError> for CallError {
        fn from(_: TimeoutError) -> Self {
            CallError::TimedOut
        }
    }

    #[tokio::test]
    async fn test_timeout_result_success() {
        let result: Result<i32, CallError> =
            with_timeout_result(Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_timeout_result_passes_through_inner_error() {
        let result: Result<i32, CallError> = with_timeout_result(Duration::from_secs(1), async {
            Err(CallError::Failed("operation failed"))
        })
        .await;

        assert_eq!(result, Err(CallError::Failed("operation failed")));
    }

    #[tokio::test]
    async fn test_timeout_result_converts_elapsed() {
        let result: Result<i32, CallError> =
            with_timeout_result(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(42)
            })
            .await;

        assert_eq!(result, Err(CallError::TimedOut));
    }
}
