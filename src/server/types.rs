//! Request and response types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::score::Sentiment;

/// How many characters of each batch item's text are echoed back before
/// truncation kicks in.
pub const PREVIEW_LEN: usize = 100;

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Review text to score.
    pub text: String,
    /// Model selector: `logreg`, `lstm`, or `bert` (case-insensitive).
    pub model: String,
    /// Opaque product label, passed through unchanged.
    pub product_name: String,
}

/// Body of a successful `POST /predict` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Review score in 1-5.
    pub score: u8,
    /// Sentiment bucket derived from the score.
    pub sentiment: Sentiment,
    /// Canonical key of the model that produced the score.
    pub model: String,
    /// The product label from the request.
    pub product_name: String,
    /// Native class probabilities; length is model-specific.
    pub probs: Vec<f32>,
}

/// Body of `POST /predict-batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Review texts to score. Blank entries are skipped.
    pub reviews: Vec<String>,
    /// Model selector: `logreg`, `lstm`, or `bert` (case-insensitive).
    pub model: String,
    /// Opaque product label, passed through unchanged.
    pub product_name: String,
}

/// One entry in a batch response, numbered by original position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// 1-based position of the review in the submitted list.
    pub index: usize,
    /// The review text, truncated to [`PREVIEW_LEN`] characters with a
    /// trailing `...` when longer.
    pub text: String,
    /// Score or per-item failure.
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Outcome of scoring one batch item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    /// The item was scored.
    Scored {
        /// Review score in 1-5.
        score: u8,
        /// Sentiment bucket derived from the score.
        sentiment: Sentiment,
        /// Native class probabilities.
        probs: Vec<f32>,
    },
    /// Scoring this item failed; the rest of the batch is unaffected.
    Failed {
        /// What went wrong.
        error: String,
    },
}

/// Sentiment histogram over the scored items of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentDistribution {
    /// Items with score 1 or 2.
    pub negative: usize,
    /// Items with score 3.
    pub neutral: usize,
    /// Items with score 4 or 5.
    pub positive: usize,
}

impl SentimentDistribution {
    /// Bumps the bucket for one sentiment.
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Positive => self.positive += 1,
        }
    }

    /// Total items recorded.
    pub fn total(&self) -> usize {
        self.negative + self.neutral + self.positive
    }
}

/// Per-score histogram over the scored items of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// Items scored 1.
    #[serde(rename = "1")]
    pub one: usize,
    /// Items scored 2.
    #[serde(rename = "2")]
    pub two: usize,
    /// Items scored 3.
    #[serde(rename = "3")]
    pub three: usize,
    /// Items scored 4.
    #[serde(rename = "4")]
    pub four: usize,
    /// Items scored 5.
    #[serde(rename = "5")]
    pub five: usize,
}

impl ScoreDistribution {
    /// Bumps the bucket for one score value.
    pub fn record(&mut self, score: u8) {
        match score {
            1 => self.one += 1,
            2 => self.two += 1,
            3 => self.three += 1,
            4 => self.four += 1,
            _ => self.five += 1,
        }
    }

    /// Total items recorded.
    pub fn total(&self) -> usize {
        self.one + self.two + self.three + self.four + self.five
    }
}

/// Aggregated statistics over the scored items of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatistics {
    /// Mean score over scored items, rounded to two decimals; 0 when
    /// nothing was scored.
    pub average_score: f64,
    /// Sentiment histogram.
    pub sentiment_distribution: SentimentDistribution,
    /// Per-score histogram.
    pub score_distribution: ScoreDistribution,
}

/// Body of a successful `POST /predict-batch` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    /// One entry per non-blank review, in submission order.
    pub results: Vec<BatchItem>,
    /// Statistics over the scored entries.
    pub statistics: BatchStatistics,
    /// Canonical key of the model used.
    pub model: String,
    /// The product label from the request.
    pub product_name: String,
    /// Number of entries in `results`.
    pub total_reviews: usize,
}

/// Per-model readiness, as reported by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHealth {
    /// Linear classifier readiness.
    pub logreg: bool,
    /// Recurrent classifier readiness.
    pub lstm: bool,
    /// Transformer classifier readiness.
    pub bert: bool,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves.
    pub status: String,
    /// Per-model readiness.
    pub models: ModelHealth,
}

/// One model entry in the service metadata response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Wire key clients select the model with.
    pub key: String,
    /// Human-readable description.
    pub description: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// The served models.
    pub models_available: Vec<ModelInfo>,
}

/// Uniform error envelope for every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
}

/// Echoes batch item text, truncating to [`PREVIEW_LEN`] characters with
/// a trailing `...` when longer.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_LEN).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
