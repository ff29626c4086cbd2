use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched social post. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
}
