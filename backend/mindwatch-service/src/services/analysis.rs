//! Analysis pipeline: resolve user → fetch posts → classify → aggregate
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::{round_to, Classifier};
use crate::error::{AppError, Result};
use crate::feed::{FeedClient, FeedError};
use crate::metrics;
use crate::models::{AnalysisResult, Distribution, Label, Prediction};

/// Progress of one `/analyze` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingUser,
    FetchingPosts,
    ClassifyingBatch,
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvingUser => "resolving_user",
            Stage::FetchingPosts => "fetching_posts",
            Stage::ClassifyingBatch => "classifying_batch",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    feed: Arc<dyn FeedClient>,
    classifier: Arc<Classifier>,
}

impl AnalysisPipeline {
    pub fn new(feed: Arc<dyn FeedClient>, classifier: Arc<Classifier>) -> Self {
        Self { feed, classifier }
    }

    /// Run the pipeline for an already validated username.
    pub async fn analyze(&self, username: &str, max_tweets: u32) -> Result<AnalysisResult> {
        let result = self.run(username, max_tweets).await;

        let outcome = match &result {
            Ok(r) if r.tweets_analyzed == 0 => "empty",
            Ok(_) => "success",
            Err(AppError::NotFound(_)) => "not_found",
            Err(AppError::UpstreamUnavailable { .. }) => "upstream_unavailable",
            Err(_) => "internal",
        };
        metrics::record_analysis(outcome);
        result
    }

    async fn run(&self, username: &str, max_tweets: u32) -> Result<AnalysisResult> {
        let mut stage = Stage::ResolvingUser;
        debug!(username, %stage, "Analysis started");

        let user = self
            .feed
            .resolve_user(username)
            .await
            .map_err(|e| feed_failure(username, stage, e))?;

        stage = Stage::FetchingPosts;
        debug!(username, %stage, user_id = %user.0, "User resolved");

        let mut posts = self
            .feed
            .fetch_recent_posts(&user, max_tweets)
            .await
            .map_err(|e| feed_failure(username, stage, e))?;

        if posts.is_empty() {
            info!(username, stage = %Stage::Done, "No recent posts, returning empty analysis");
            return Ok(AnalysisResult::empty(username));
        }
        // The upstream is asked for at least its floor, which can exceed max_tweets
        posts.truncate(max_tweets as usize);

        stage = Stage::ClassifyingBatch;
        debug!(username, %stage, posts = posts.len(), "Classifying posts");

        let classifier = self.classifier.clone();
        let predictions = tokio::task::spawn_blocking(move || classifier.classify_batch(posts))
            .await
            .map_err(|e| AppError::Internal(format!("classification task failed: {}", e)))?;

        stage = Stage::Aggregating;
        debug!(username, %stage, "Aggregating predictions");
        let overall_summary = summarize(&predictions);
        let valid = predictions
            .iter()
            .filter(|p| p.outcome.label().is_some())
            .count();

        info!(
            username,
            stage = %Stage::Done,
            posts = predictions.len(),
            valid_predictions = valid,
            "Analysis completed"
        );

        Ok(AnalysisResult {
            username: username.to_string(),
            tweets_analyzed: predictions.len(),
            overall_summary,
            predictions,
        })
    }
}

fn feed_failure(username: &str, stage: Stage, err: FeedError) -> AppError {
    match &err {
        FeedError::NotFound(_) => info!(username, %stage, "Twitter user not found"),
        _ => warn!(username, %stage, error = %err, "Feed request failed"),
    }
    AppError::from(err)
}

/// Share of each category among valid predictions, in percent (1 decimal).
///
/// Placeholder outcomes are excluded from both numerator and denominator.
/// With no valid prediction every category is 0.0.
pub fn summarize(predictions: &[Prediction]) -> Distribution {
    let mut counts = [0usize; Label::COUNT];
    for label in predictions.iter().filter_map(|p| p.outcome.label()) {
        counts[label.index()] += 1;
    }

    let valid: usize = counts.iter().sum();
    if valid == 0 {
        return Distribution::zero();
    }

    let mut values = [0.0; Label::COUNT];
    for (slot, count) in values.iter_mut().zip(counts) {
        *slot = round_to(count as f64 / valid as f64 * 100.0, 1);
    }
    Distribution::from_values(values)
}
