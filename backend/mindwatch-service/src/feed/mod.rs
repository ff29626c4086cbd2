//! Social feed access
//!
//! [`FeedClient`] is the narrow contract the analysis pipeline needs:
//! resolve a username, then fetch that user's recent posts.

pub mod twitter;

use async_trait::async_trait;
use resilience::TimeoutError;

use crate::models::Post;

pub use twitter::{TwitterClient, TwitterConfig};

/// Smallest page size the upstream accepts.
pub const MIN_FETCH: u32 = 5;
/// Largest page size the upstream accepts.
pub const MAX_FETCH: u32 = 100;

/// Upstream identifier of a resolved account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUserId(pub String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("user not found: {0}")]
    NotFound(String),

    /// Quota exhausted. `retry_after` is in seconds when the upstream said so.
    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<u64> },

    #[error("upstream error (status {status:?}): {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        retriable: bool,
    },

    #[error("upstream rejected credentials: {0}")]
    Unauthorized(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl FeedError {
    /// Whether the same call may succeed later without any change on our side.
    pub fn is_retriable(&self) -> bool {
        match self {
            FeedError::RateLimited { .. } => true,
            FeedError::Upstream { retriable, .. } => *retriable,
            FeedError::NotFound(_) | FeedError::Unauthorized(_) | FeedError::Decode(_) => false,
        }
    }
}

impl From<TimeoutError> for FeedError {
    fn from(err: TimeoutError) -> Self {
        FeedError::Upstream {
            status: None,
            message: err.to_string(),
            retriable: true,
        }
    }
}

/// Clamp a requested post count into the range the upstream accepts.
pub fn clamp_fetch_count(requested: u32) -> u32 {
    requested.clamp(MIN_FETCH, MAX_FETCH)
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn resolve_user(&self, username: &str) -> Result<FeedUserId, FeedError>;

    /// Most recent posts, newest first. No posts is `Ok(vec![])`.
    async fn fetch_recent_posts(
        &self,
        user: &FeedUserId,
        max_results: u32,
    ) -> Result<Vec<Post>, FeedError>;

    /// Startup probe of connectivity and credentials.
    async fn verify(&self) -> Result<(), FeedError> {
        Ok(())
    }
}
