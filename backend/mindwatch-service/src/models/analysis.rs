//! Classification outcomes and the `/analyze` result shape.
//!
//! Real categories and the two placeholder outcomes live in disjoint types:
//! [`Label`] is the closed set the model predicts, while
//! [`Classification::InvalidInput`] and [`Classification::PredictionError`]
//! only become strings at the JSON boundary.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::Post;

/// Wire name of the placeholder for empty or missing text.
pub const INVALID_INPUT: &str = "Invalid Input";
/// Wire name of the placeholder for a failed model call.
pub const PREDICTION_ERROR: &str = "Prediction Error";

/// Mental-health signal categories, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Normal,
    Stressed,
    Anxiety,
    Depression,
    PotentialSuicidePost,
}

impl Label {
    pub const COUNT: usize = 5;

    pub const ALL: [Label; Label::COUNT] = [
        Label::Normal,
        Label::Stressed,
        Label::Anxiety,
        Label::Depression,
        Label::PotentialSuicidePost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Normal => "Normal",
            Label::Stressed => "Stressed",
            Label::Anxiety => "Anxiety",
            Label::Depression => "Depression",
            Label::PotentialSuicidePost => "Potential Suicide Post",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Label> {
        Label::ALL.get(index).copied()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown label '{}'", s))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Percentage per category, serialized as a JSON object in label order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Distribution([f64; Label::COUNT]);

impl Distribution {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_values(values: [f64; Label::COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, label: Label) -> f64 {
        self.0[label.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, f64)> + '_ {
        Label::ALL.iter().map(move |label| (*label, self.0[label.index()]))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Highest-scoring label; ties resolve to the earliest label.
    pub fn argmax(&self) -> Label {
        let mut best = Label::Normal;
        for (label, value) in self.iter() {
            if value > self.get(best) {
                best = label;
            }
        }
        best
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Label::COUNT))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label.as_str(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Distribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, f64>::deserialize(deserializer)?;
        let mut values = [0.0; Label::COUNT];
        for (name, value) in raw {
            let label = name.parse::<Label>().map_err(D::Error::custom)?;
            values[label.index()] = value;
        }
        Ok(Self(values))
    }
}

/// Outcome of classifying one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ClassificationWire", try_from = "ClassificationWire")]
pub enum Classification {
    Predicted {
        label: Label,
        distribution: Distribution,
    },
    InvalidInput,
    PredictionError,
}

impl Classification {
    /// The predicted category, or `None` for placeholder outcomes.
    pub fn label(&self) -> Option<Label> {
        match self {
            Classification::Predicted { label, .. } => Some(*label),
            _ => None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Classification::Predicted { label, .. } => label.as_str(),
            Classification::InvalidInput => INVALID_INPUT,
            Classification::PredictionError => PREDICTION_ERROR,
        }
    }

    pub fn distribution(&self) -> Distribution {
        match self {
            Classification::Predicted { distribution, .. } => *distribution,
            _ => Distribution::zero(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ClassificationWire {
    predicted_state: String,
    probabilities: Distribution,
}

impl From<Classification> for ClassificationWire {
    fn from(outcome: Classification) -> Self {
        Self {
            predicted_state: outcome.state_name().to_string(),
            probabilities: outcome.distribution(),
        }
    }
}

impl TryFrom<ClassificationWire> for Classification {
    type Error = String;

    fn try_from(wire: ClassificationWire) -> Result<Self, Self::Error> {
        match wire.predicted_state.as_str() {
            INVALID_INPUT => Ok(Classification::InvalidInput),
            PREDICTION_ERROR => Ok(Classification::PredictionError),
            other => Ok(Classification::Predicted {
                label: other.parse()?,
                distribution: wire.probabilities,
            }),
        }
    }
}

/// A post together with its classification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(flatten)]
    pub post: Post,
    #[serde(flatten)]
    pub outcome: Classification,
}

/// Response body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub username: String,
    pub tweets_analyzed: usize,
    pub overall_summary: Distribution,
    pub predictions: Vec<Prediction>,
}

impl AnalysisResult {
    pub fn empty(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tweets_analyzed: 0,
            overall_summary: Distribution::zero(),
            predictions: Vec::new(),
        }
    }
}
