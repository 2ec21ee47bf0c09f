//! Request handlers: validation, dispatch to the selected classifier, and
//! response assembly.

use axum::extract::State;
use axum::Json;
use tracing::{error, warn};

use super::types::{
    preview, BatchItem, BatchOutcome, BatchRequest, BatchResponse, BatchStatistics,
    HealthResponse, ModelHealth, ModelInfo, PredictRequest, PredictResponse, RootResponse,
    ScoreDistribution, SentimentDistribution,
};
use super::AppState;
use crate::error::{Result, ServeError};
use crate::registry::ModelKind;

pub(super) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "Review Sentiment API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models_available: ModelKind::ALL
            .iter()
            .map(|kind| ModelInfo {
                key: kind.key().to_string(),
                description: kind.description().to_string(),
            })
            .collect(),
    })
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        models: ModelHealth {
            logreg: state.registry.is_available(ModelKind::LogReg),
            lstm: state.registry.is_available(ModelKind::Lstm),
            bert: state.registry.is_available(ModelKind::Bert),
        },
    })
}

pub(super) async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    if request.text.trim().is_empty() {
        return Err(ServeError::EmptyText);
    }
    let kind = ModelKind::parse(&request.model)
        .ok_or_else(|| ServeError::UnknownModel(request.model.clone()))?;
    let classifier = state.registry.get(kind)?;

    let prediction = classifier.predict(&request.text).map_err(|e| {
        error!(model = kind.key(), %e, "prediction failed");
        e
    })?;

    Ok(Json(PredictResponse {
        score: prediction.score.get(),
        sentiment: prediction.score.sentiment(),
        model: kind.key().to_string(),
        product_name: request.product_name,
        probs: prediction.probs,
    }))
}

pub(super) async fn predict_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    if request.reviews.is_empty() {
        return Err(ServeError::EmptyBatch);
    }
    let kind = ModelKind::parse(&request.model)
        .ok_or_else(|| ServeError::UnknownModel(request.model.clone()))?;
    let classifier = state.registry.get(kind)?;

    let mut results = Vec::with_capacity(request.reviews.len());
    let mut score_sum = 0u64;
    let mut sentiments = SentimentDistribution::default();
    let mut scores = ScoreDistribution::default();

    for (position, text) in request.reviews.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let outcome = match classifier.predict(text) {
            Ok(prediction) => {
                let score = prediction.score;
                score_sum += u64::from(score.get());
                sentiments.record(score.sentiment());
                scores.record(score.get());
                BatchOutcome::Scored {
                    score: score.get(),
                    sentiment: score.sentiment(),
                    probs: prediction.probs,
                }
            }
            Err(e) => {
                warn!(model = kind.key(), index = position + 1, %e, "batch item failed");
                BatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        results.push(BatchItem {
            index: position + 1,
            text: preview(text),
            outcome,
        });
    }

    let statistics = BatchStatistics {
        average_score: mean_score(score_sum, scores.total()),
        sentiment_distribution: sentiments,
        score_distribution: scores,
    };

    Ok(Json(BatchResponse {
        total_reviews: results.len(),
        results,
        statistics,
        model: kind.key().to_string(),
        product_name: request.product_name,
    }))
}

/// Mean over scored items, rounded to two decimals; 0 for an empty set.
fn mean_score(sum: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let mean = sum as f64 / count as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::mean_score;

    #[test]
    fn mean_rounds_to_two_decimals() {
        assert_eq!(mean_score(0, 0), 0.0);
        assert_eq!(mean_score(10, 4), 2.5);
        // 10 / 3 = 3.333... -> 3.33
        assert_eq!(mean_score(10, 3), 3.33);
    }
}
