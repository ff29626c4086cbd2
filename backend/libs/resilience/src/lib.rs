/// Resilience helpers for outbound calls
///
/// - **Timeout**: bound a single call so a stalled upstream cannot hold a request forever
/// - **Retry**: exponential backoff with jitter, optionally gated on the error kind
///
/// # Example: retry only transient failures
///
/// ```rust,no_run
/// use resilience::{with_retry_if, RetryConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_retry_if(
///         RetryConfig::default(),
///         || async { Err::<(), _>("503 from upstream") },
///         |e: &&str| e.starts_with("503"),
///     )
///     .await;
///     assert!(result.is_err());
/// }
/// ```

pub mod retry;
pub mod timeout;

pub use retry::{with_retry_if, RetryConfig};
pub use timeout::{with_timeout_result, TimeoutError};
