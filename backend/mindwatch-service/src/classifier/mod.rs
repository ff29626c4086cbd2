//! Mental-health signal classifier
//!
//! [`Classifier`] turns raw model scores into a [`Classification`]. The model
//! itself sits behind [`SequenceModel`], so the ONNX backend can be swapped
//! for a deterministic one in tests.

pub mod onnx;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::metrics;
use crate::models::{Classification, Distribution, Label, Post, Prediction};

pub use onnx::OnnxSequenceModel;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("model initialisation failed: {0}")]
    Init(String),

    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: expected {expected} scores, got {actual}")]
    OutputShape { expected: usize, actual: usize },
}

/// A text classification model producing one raw score per [`Label`].
#[cfg_attr(test, mockall::automock)]
pub trait SequenceModel: Send + Sync {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;
}

pub struct Classifier {
    model: Arc<dyn SequenceModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn SequenceModel>) -> Self {
        Self { model }
    }

    /// Classify one piece of text.
    ///
    /// Missing or blank text yields `InvalidInput` without touching the model.
    /// Model failures yield `PredictionError` and are logged, never returned.
    pub fn classify(&self, text: Option<&str>) -> Classification {
        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Classification::InvalidInput,
        };

        match self.predict(text) {
            Ok((label, distribution)) => Classification::Predicted {
                label,
                distribution,
            },
            Err(e) => {
                warn!(
                    error = %e,
                    preview = %preview(text),
                    "Classification failed for post"
                );
                Classification::PredictionError
            }
        }
    }

    /// Classify posts one after another, keeping their order.
    pub fn classify_batch(&self, posts: Vec<Post>) -> Vec<Prediction> {
        posts
            .into_iter()
            .map(|post| {
                let outcome = self.classify(Some(&post.text));
                metrics::record_classified_post(outcome.state_name());
                Prediction { post, outcome }
            })
            .collect()
    }

    fn predict(&self, text: &str) -> Result<(Label, Distribution), ClassifierError> {
        let logits = self.model.logits(text)?;
        if logits.len() != Label::COUNT {
            return Err(ClassifierError::OutputShape {
                expected: Label::COUNT,
                actual: logits.len(),
            });
        }

        let distribution = softmax_percentages(&logits)
            .ok_or_else(|| ClassifierError::Inference("non-finite model scores".to_string()))?;
        Ok((distribution.argmax(), distribution))
    }
}

/// Softmax over `logits`, as percentages rounded to 2 decimals.
///
/// Returns `None` when the length is wrong or any score is not finite.
pub fn softmax_percentages(logits: &[f32]) -> Option<Distribution> {
    if logits.len() != Label::COUNT || logits.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|v| (*v as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    let mut values = [0.0; Label::COUNT];
    for (slot, e) in values.iter_mut().zip(exps) {
        *slot = round_to(e / sum * 100.0, 2);
    }
    Some(Distribution::from_values(values))
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
