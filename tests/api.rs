use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use review_serve::error::{Result, ServeError};
use review_serve::models::{Prediction, ReviewClassifier};
use review_serve::registry::{ModelKind, ModelRegistry};
use review_serve::score::Score;
use review_serve::server::{create_router, AppState};

/// Stub classifier returning a fixed score and probability vector.
struct Fixed {
    score: u8,
    probs: Vec<f32>,
}

impl Fixed {
    fn new(score: u8, probs: Vec<f32>) -> Box<Self> {
        Box::new(Self { score, probs })
    }
}

impl ReviewClassifier for Fixed {
    fn predict(&self, _text: &str) -> Result<Prediction> {
        Ok(Prediction {
            score: Score::from_five_class(self.score as usize - 1),
            probs: self.probs.clone(),
        })
    }
}

/// Stub classifier that fails on texts containing a trigger word.
struct FailOn {
    trigger: &'static str,
}

impl ReviewClassifier for FailOn {
    fn predict(&self, text: &str) -> Result<Prediction> {
        if text.contains(self.trigger) {
            return Err(ServeError::Inference("tensor shape mismatch".to_string()));
        }
        Ok(Prediction {
            score: Score::from_five_class(4),
            probs: vec![0.0, 0.0, 0.0, 0.0, 1.0],
        })
    }
}

fn app(registry: ModelRegistry) -> Router {
    create_router(AppState::new(registry))
}

fn app_with_bert(score: u8) -> Router {
    app(ModelRegistry::builder()
        .classifier(ModelKind::Bert, Fixed::new(score, vec![0.0, 0.0, 0.0, 0.0, 1.0]))
        .build())
}

async fn get(router: Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn post(router: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn root_lists_the_served_models() {
    let (status, body) = get(app_with_bert(5), "/").await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body["models_available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["logreg", "lstm", "bert"]);
}

#[tokio::test]
async fn health_reports_per_model_status() {
    let registry = ModelRegistry::builder()
        .classifier(ModelKind::Bert, Fixed::new(5, vec![1.0]))
        .unavailable(ModelKind::Lstm, "weights missing")
        .build();
    let (status, body) = get(app(registry), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models"]["bert"], true);
    assert_eq!(body["models"]["lstm"], false);
    assert_eq!(body["models"]["logreg"], false);
}

#[tokio::test]
async fn predict_returns_the_uniform_response() {
    let body = json!({"text": "great blender", "model": "bert", "product_name": "Blendtec"});
    let (status, body) = post(app_with_bert(5), "/predict", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 5);
    assert_eq!(body["sentiment"], "positive");
    assert_eq!(body["model"], "bert");
    assert_eq!(body["product_name"], "Blendtec");
    assert_eq!(body["probs"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn predict_parses_the_selector_loosely() {
    let body = json!({"text": "ok", "model": "  BERT ", "product_name": "p"});
    let (status, body) = post(app_with_bert(3), "/predict", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"], "neutral");
}

#[tokio::test]
async fn predict_rejects_empty_text() {
    let body = json!({"text": "   ", "model": "bert", "product_name": "p"});
    let (status, body) = post(app_with_bert(5), "/predict", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn predict_rejects_unknown_models() {
    let body = json!({"text": "fine", "model": "gpt", "product_name": "p"});
    let (status, body) = post(app_with_bert(5), "/predict", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("gpt"));
}

#[tokio::test]
async fn unavailable_model_fails_without_taking_the_others_down() {
    let registry = ModelRegistry::builder()
        .classifier(ModelKind::LogReg, Fixed::new(4, vec![0.0; 5]))
        .unavailable(ModelKind::Bert, "download failed")
        .build();
    let router = app(registry);

    let body = json!({"text": "fine", "model": "bert", "product_name": "p"});
    let (status, body) = post(router.clone(), "/predict", body).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("download failed"));

    let body = json!({"text": "fine", "model": "logreg", "product_name": "p"});
    let (status, body) = post(router, "/predict", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 4);
}

#[tokio::test]
async fn batch_aggregates_statistics_over_scored_items() {
    let body = json!({
        "reviews": ["good product", "terrible", "ok"],
        "model": "bert",
        "product_name": "p",
    });
    let (status, body) = post(app_with_bert(4), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_reviews"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["statistics"]["average_score"], 4.0);

    let sentiments = &body["statistics"]["sentiment_distribution"];
    let sentiment_total = sentiments["negative"].as_u64().unwrap()
        + sentiments["neutral"].as_u64().unwrap()
        + sentiments["positive"].as_u64().unwrap();
    assert_eq!(sentiment_total, 3);

    let scores = &body["statistics"]["score_distribution"];
    let score_total: u64 = (1..=5)
        .map(|s| scores[s.to_string()].as_u64().unwrap())
        .sum();
    assert_eq!(score_total, 3);
}

#[tokio::test]
async fn batch_skips_blank_items_but_keeps_original_numbering() {
    let body = json!({
        "reviews": ["good", "   ", "ok"],
        "model": "bert",
        "product_name": "p",
    });
    let (status, body) = post(app_with_bert(5), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_reviews"], 2);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["index"], 1);
    assert_eq!(results[1]["index"], 3);
}

#[tokio::test]
async fn batch_truncates_long_item_text() {
    let long = "z".repeat(150);
    let body = json!({
        "reviews": [long, "short"],
        "model": "bert",
        "product_name": "p",
    });
    let (status, body) = post(app_with_bert(5), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    let shown = results[0]["text"].as_str().unwrap();
    assert_eq!(shown.chars().count(), 103);
    assert!(shown.ends_with("..."));
    assert_eq!(results[1]["text"], "short");
}

#[tokio::test]
async fn batch_isolates_per_item_failures() {
    let registry = ModelRegistry::builder()
        .classifier(ModelKind::Bert, Box::new(FailOn { trigger: "boom" }))
        .build();
    let body = json!({
        "reviews": ["fine", "this goes boom", "also fine"],
        "model": "bert",
        "product_name": "p",
    });
    let (status, body) = post(app(registry), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[1]["error"].as_str().unwrap().contains("inference"));
    assert!(results[1].get("score").is_none());
    assert_eq!(results[2]["score"], 5);

    // Failed items stay out of the statistics.
    assert_eq!(body["statistics"]["sentiment_distribution"]["positive"], 2);
    assert_eq!(body["statistics"]["score_distribution"]["5"], 2);
}

#[tokio::test]
async fn batch_rejects_unknown_models_before_scoring() {
    let body = json!({
        "reviews": ["fine"],
        "model": "word2vec",
        "product_name": "p",
    });
    let (status, body) = post(app_with_bert(5), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("word2vec"));
}

#[tokio::test]
async fn batch_rejects_an_empty_review_list() {
    let body = json!({"reviews": [], "model": "bert", "product_name": "p"});
    let (status, _) = post(app_with_bert(5), "/predict-batch", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
