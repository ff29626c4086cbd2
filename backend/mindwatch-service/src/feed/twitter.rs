//! Twitter API v2 client
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::HeaderMap, Client, StatusCode};
use resilience::{with_retry_if, with_timeout_result, RetryConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{clamp_fetch_count, FeedClient, FeedError, FeedUserId};
use crate::models::Post;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/2";

/// Account resolved by `verify()` to prove the credential works.
const PROBE_USERNAME: &str = "TwitterDev";

#[derive(Clone)]
pub struct TwitterConfig {
    pub base_url: String,
    pub bearer_token: String,
    /// Bound on every single upstream call
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Option<Vec<TweetData>>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PublicMetrics {
    like_count: u64,
    retweet_count: u64,
}

impl TryFrom<TweetData> for Post {
    type Error = FeedError;

    fn try_from(tweet: TweetData) -> Result<Self, Self::Error> {
        let id = tweet
            .id
            .parse::<u64>()
            .map_err(|_| FeedError::Decode(format!("non-numeric tweet id '{}'", tweet.id)))?;
        let metrics = tweet.public_metrics.unwrap_or_default();
        Ok(Post {
            id,
            text: tweet.text,
            created_at: tweet.created_at,
            likes: metrics.like_count,
            retweets: metrics.retweet_count,
        })
    }
}

pub struct TwitterClient {
    client: Client,
    base_url: String,
    bearer_token: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl TwitterClient {
    pub fn new(config: TwitterConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(concat!("mindwatch-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Upstream {
                status: None,
                message: format!("failed to build HTTP client: {}", e),
                retriable: false,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token,
            timeout: config.timeout,
            retry: RetryConfig {
                max_retries: config.max_retries,
                initial_backoff: Duration::from_millis(250),
                max_backoff: Duration::from_secs(5),
                ..Default::default()
            },
        })
    }

    /// Replace the backoff policy for transient failures.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// GET `path` with bounded retries. Rate limits are never retried here;
    /// the caller surfaces them with the upstream's reset time instead.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        with_retry_if(
            self.retry.clone(),
            || with_timeout_result(self.timeout, self.send_once::<T>(&url, query, subject)),
            |e: &FeedError| e.is_retriable() && !matches!(e, FeedError::RateLimited { .. }),
        )
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, FeedError> {
        debug!(url, "Calling Twitter API");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, subject, &body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| FeedError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FeedClient for TwitterClient {
    async fn resolve_user(&self, username: &str) -> Result<FeedUserId, FeedError> {
        let path = format!("/users/by/username/{}", username);
        let response: UserLookupResponse = self.get_json(&path, &[], username).await?;

        // v2 reports unknown usernames as 200 with an `errors` array and no `data`
        response
            .data
            .map(|user| FeedUserId(user.id))
            .ok_or_else(|| FeedError::NotFound(username.to_string()))
    }

    async fn fetch_recent_posts(
        &self,
        user: &FeedUserId,
        max_results: u32,
    ) -> Result<Vec<Post>, FeedError> {
        let path = format!("/users/{}/tweets", user.0);
        let query = [
            ("max_results", clamp_fetch_count(max_results).to_string()),
            ("tweet.fields", "created_at,public_metrics".to_string()),
        ];
        let response: TimelineResponse = self.get_json(&path, &query, &user.0).await?;

        response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Post::try_from)
            .collect()
    }

    async fn verify(&self) -> Result<(), FeedError> {
        match self.resolve_user(PROBE_USERNAME).await {
            Ok(_) | Err(FeedError::NotFound(_)) => {
                info!(base_url = %self.base_url, "Twitter API credentials verified");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Twitter API verification failed");
                Err(e)
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> FeedError {
    FeedError::Upstream {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
        retriable: true,
    }
}

fn classify_status(
    status: StatusCode,
    retry_after: Option<u64>,
    subject: &str,
    body: &str,
) -> FeedError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FeedError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FeedError::Unauthorized(format!("HTTP {}", status.as_u16()))
        }
        StatusCode::NOT_FOUND => FeedError::NotFound(subject.to_string()),
        s => FeedError::Upstream {
            status: Some(s.as_u16()),
            message: body.chars().take(200).collect(),
            retriable: s.is_server_error(),
        },
    }
}

/// Seconds until `x-rate-limit-reset` (a Unix timestamp), at least 1.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let reset = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    let remaining = reset - Utc::now().timestamp();
    Some(remaining.max(1) as u64)
}
