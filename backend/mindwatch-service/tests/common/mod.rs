//! Shared fakes for HTTP-level tests
#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mindwatch_service::{
    classifier::{Classifier, ClassifierError, SequenceModel},
    feed::{FeedClient, FeedError, FeedUserId},
    models::Post,
    security::JwtKeys,
    store::MemoryDocumentStore,
    AppState,
};

pub const JWT_SECRET: &str = "integration-test-secret";

/// What the fake feed does for one username.
#[derive(Clone)]
pub enum FeedScript {
    Posts(Vec<Post>),
    RateLimited(Option<u64>),
    Outage,
    Garbled,
}

/// In-memory feed keyed by username; unknown usernames are not found.
#[derive(Default)]
pub struct FakeFeed {
    scripts: HashMap<String, FeedScript>,
    pub requested: Mutex<Vec<u32>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, username: &str, script: FeedScript) -> Self {
        self.scripts.insert(username.to_string(), script);
        self
    }
}

#[async_trait]
impl FeedClient for FakeFeed {
    async fn resolve_user(&self, username: &str) -> Result<FeedUserId, FeedError> {
        match self.scripts.get(username) {
            Some(_) => Ok(FeedUserId(username.to_string())),
            None => Err(FeedError::NotFound(username.to_string())),
        }
    }

    async fn fetch_recent_posts(
        &self,
        user: &FeedUserId,
        max_results: u32,
    ) -> Result<Vec<Post>, FeedError> {
        self.requested.lock().unwrap().push(max_results);
        match self.scripts.get(&user.0) {
            Some(FeedScript::Posts(posts)) => Ok(posts.clone()),
            Some(FeedScript::RateLimited(retry_after)) => Err(FeedError::RateLimited {
                retry_after: *retry_after,
            }),
            Some(FeedScript::Outage) => Err(FeedError::Upstream {
                status: Some(503),
                message: "service unavailable".into(),
                retriable: true,
            }),
            Some(FeedScript::Garbled) => Err(FeedError::Decode("expected value".into())),
            None => Err(FeedError::NotFound(user.0.clone())),
        }
    }
}

/// Keyword model: "panic" → Anxiety, "hopeless" → Depression,
/// "explode" → inference failure, anything else → Normal.
pub struct KeywordModel;

impl SequenceModel for KeywordModel {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let lower = text.to_lowercase();
        if lower.contains("explode") {
            return Err(ClassifierError::Inference("tensor shape mismatch".into()));
        }
        let hot = if lower.contains("panic") {
            2
        } else if lower.contains("hopeless") {
            3
        } else {
            0
        };
        let mut logits = vec![0.0f32; 5];
        logits[hot] = 6.0;
        Ok(logits)
    }
}

pub fn post(id: u64, text: &str) -> Post {
    Post {
        id,
        text: text.to_string(),
        created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        likes: id * 2,
        retweets: id,
    }
}

pub fn state_with_feed(feed: Arc<FakeFeed>) -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Arc::new(MemoryDocumentStore::new()),
        feed,
        Arc::new(Classifier::new(Arc::new(KeywordModel))),
        JwtKeys::new(JWT_SECRET, 24),
    ))
}

pub fn state() -> web::Data<AppState> {
    state_with_feed(Arc::new(FakeFeed::new()))
}
