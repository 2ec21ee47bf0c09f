//! Linear bag-of-words classifier: a fitted tf-idf vectorizer plus a
//! multinomial logistic regression.
//!
//! Training happens offline in Python; this is inference only. The fitted
//! transform and coefficients are exported to a single JSON artifact
//! (`linear/model.json` under the models directory).

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{argmax, Prediction, ReviewClassifier};
use crate::error::{Result, ServeError};
use crate::loaders::read_json;
use crate::score::Score;
use crate::text::normalize;

// Matches the vectorizer's token pattern: word characters, two or more.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

#[derive(Deserialize)]
struct LinearArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// Tf-idf + logistic regression review classifier.
///
/// Native output is a zero-based 5-way class over the star scale; scores
/// are mapped through [`Score::from_five_class`].
pub struct LinearClassifier {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f32>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearClassifier {
    /// Loads the classifier from `<dir>/model.json`.
    pub fn load(dir: &Path) -> Result<Self> {
        let artifact: LinearArtifact = read_json(&dir.join("model.json"))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: LinearArtifact) -> Result<Self> {
        let vocab_len = artifact.vocabulary.len();
        if artifact.idf.len() != vocab_len {
            return Err(ServeError::Artifact(format!(
                "idf length {} does not match vocabulary size {}",
                artifact.idf.len(),
                vocab_len
            )));
        }
        if let Some(&bad) = artifact.vocabulary.values().find(|&&i| i >= vocab_len) {
            return Err(ServeError::Artifact(format!(
                "vocabulary index {bad} out of range for {vocab_len} terms"
            )));
        }
        let classes = artifact.coef.len();
        if classes == 0 || artifact.intercept.len() != classes {
            return Err(ServeError::Artifact(format!(
                "coefficient rows {} do not match intercepts {}",
                classes,
                artifact.intercept.len()
            )));
        }
        let mut coef = Array2::zeros((classes, vocab_len));
        for (c, row) in artifact.coef.iter().enumerate() {
            if row.len() != vocab_len {
                return Err(ServeError::Artifact(format!(
                    "coefficient row {c} has {} entries, expected {vocab_len}",
                    row.len()
                )));
            }
            for (i, &w) in row.iter().enumerate() {
                coef[[c, i]] = w;
            }
        }
        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: Array1::from_vec(artifact.idf),
            coef,
            intercept: Array1::from_vec(artifact.intercept),
        })
    }

    /// Tf-idf vector of the normalized text, as sparse (index, value)
    /// pairs with l2 normalization.
    fn vectorize(&self, text: &str) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in TOKEN_RE.find_iter(text) {
            if let Some(&idx) = self.vocabulary.get(token.as_str()) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let norm = entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, v) in entries.iter_mut() {
                *v /= norm;
            }
        }
        entries
    }
}

impl ReviewClassifier for LinearClassifier {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let entries = self.vectorize(&normalize(text));

        let mut logits = self.intercept.clone();
        for &(idx, value) in &entries {
            for c in 0..logits.len() {
                logits[c] += self.coef[[c, idx]] * value;
            }
        }

        let probs = softmax(logits.as_slice().unwrap_or(&[]));
        let class = argmax(&probs);
        Ok(Prediction {
            score: Score::from_five_class(class),
            probs,
        })
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}
