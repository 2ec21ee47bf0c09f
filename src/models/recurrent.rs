//! Recurrent review classifier: embedding → LSTM → dense binary head.
//!
//! The network and its word-index tokenizer are trained offline; weights
//! arrive as safetensors with layer dimensions in a sidecar config. The
//! native output is a 2-class verdict, mapped onto the star scale through
//! [`Score::from_binary`] — the coarse binary-to-5-point mapping keeps only
//! the extremes of the scale.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{Embedding, LSTMConfig, Linear, Module, VarBuilder, LSTM, RNN};
use serde::Deserialize;

use super::{Prediction, ReviewClassifier};
use crate::error::{Result, ServeError};
use crate::loaders::{read_json, weights_path};
use crate::score::Score;
use crate::text::normalize;

fn default_max_len() -> usize {
    150
}

fn default_oov_index() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
struct RecurrentConfig {
    vocab_size: usize,
    embedding_dim: usize,
    hidden_dim: usize,
    #[serde(default = "default_max_len")]
    max_len: usize,
    #[serde(default = "default_oov_index")]
    oov_index: u32,
}

/// LSTM review classifier over fixed-length, post-padded word sequences.
pub struct RecurrentClassifier {
    word_index: HashMap<String, u32>,
    config: RecurrentConfig,
    embedding: Embedding,
    lstm: LSTM,
    classifier: Linear,
    device: Device,
}

impl RecurrentClassifier {
    /// Loads the classifier from `<dir>/{config.json, word_index.json,
    /// model.safetensors}`.
    pub fn load(dir: &Path, device: &Device) -> Result<Self> {
        let config: RecurrentConfig = read_json(&dir.join("config.json"))?;
        if config.vocab_size == 0 || config.max_len == 0 {
            return Err(ServeError::Artifact(
                "recurrent config has zero vocab_size or max_len".to_string(),
            ));
        }
        let word_index: HashMap<String, u32> = read_json(&dir.join("word_index.json"))?;

        let weights = weights_path(dir)?;
        let vb = if weights.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(&weights, DType::F32, device)?
        };

        let embedding = candle_nn::embedding(
            config.vocab_size,
            config.embedding_dim,
            vb.pp("embedding"),
        )?;
        let lstm = candle_nn::lstm(
            config.embedding_dim,
            config.hidden_dim,
            LSTMConfig::default(),
            vb.pp("lstm"),
        )?;
        let classifier = candle_nn::linear(config.hidden_dim, 2, vb.pp("classifier"))?;

        Ok(Self {
            word_index,
            config,
            embedding,
            lstm,
            classifier,
            device: device.clone(),
        })
    }

    /// Encodes text into a fixed-length id sequence: known words map
    /// through the word index, unknown words to the OOV index, and the
    /// sequence is post-padded with zeros (keeping the tail on overflow).
    fn encode(&self, text: &str) -> Vec<u32> {
        let normalized = normalize(text);
        // The word index was built on punctuation-free tokens.
        let stripped: String = normalized
            .chars()
            .map(|c| if matches!(c, '.' | '!' | '?') { ' ' } else { c })
            .collect();

        let mut ids: Vec<u32> = stripped
            .split_whitespace()
            .map(|token| {
                self.word_index
                    .get(token)
                    .copied()
                    .filter(|&id| (id as usize) < self.config.vocab_size)
                    .unwrap_or(self.config.oov_index)
            })
            .collect();

        if ids.len() > self.config.max_len {
            ids.drain(..ids.len() - self.config.max_len);
        }
        ids.resize(self.config.max_len, 0);
        ids
    }
}

impl ReviewClassifier for RecurrentClassifier {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let ids = self.encode(text);
        let input = Tensor::from_vec(ids, (1, self.config.max_len), &self.device)?;

        let embedded = self.embedding.forward(&input)?;
        let states = self.lstm.seq(&embedded)?;
        let last = states.last().ok_or_else(|| {
            ServeError::Inference("LSTM produced no states for a non-empty sequence".to_string())
        })?;
        let logits = self.classifier.forward(last.h())?;

        let probs = softmax(&logits, D::Minus1)?;
        let class = logits.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()?;
        let probs_vec = probs.squeeze(0)?.to_vec1::<f32>()?;

        Ok(Prediction {
            score: Score::from_binary(class as usize),
            probs: probs_vec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config() -> RecurrentConfig {
        RecurrentConfig {
            vocab_size: 10,
            embedding_dim: 4,
            hidden_dim: 3,
            max_len: 6,
            oov_index: 1,
        }
    }

    fn classifier_for_encoding() -> RecurrentClassifier {
        let config = tiny_config();
        let device = Device::Cpu;
        let vb = VarBuilder::zeros(DType::F32, &device);
        RecurrentClassifier {
            word_index: HashMap::from([
                ("good".to_string(), 2),
                ("bad".to_string(), 3),
                ("product".to_string(), 9),
                ("rare".to_string(), 42),
            ]),
            embedding: candle_nn::embedding(
                config.vocab_size,
                config.embedding_dim,
                vb.pp("embedding"),
            )
            .unwrap(),
            lstm: candle_nn::lstm(
                config.embedding_dim,
                config.hidden_dim,
                LSTMConfig::default(),
                vb.pp("lstm"),
            )
            .unwrap(),
            classifier: candle_nn::linear(config.hidden_dim, 2, vb.pp("classifier")).unwrap(),
            config,
            device,
        }
    }

    #[test]
    fn encodes_known_unknown_and_padding() {
        let clf = classifier_for_encoding();
        // "zzz" is unknown, "rare" is above vocab_size: both become OOV.
        assert_eq!(clf.encode("Good zzz rare product!"), vec![2, 1, 1, 9, 0, 0]);
    }

    #[test]
    fn long_sequences_keep_the_tail() {
        let clf = classifier_for_encoding();
        let text = "bad bad bad bad bad bad bad good";
        let ids = clf.encode(text);
        assert_eq!(ids.len(), 6);
        assert_eq!(ids, vec![3, 3, 3, 3, 3, 2]);
    }

    #[test]
    fn blank_text_encodes_to_all_padding() {
        let clf = classifier_for_encoding();
        assert_eq!(clf.encode("  "), vec![0; 6]);
    }

    #[test]
    fn zero_weights_still_score_in_range() {
        let clf = classifier_for_encoding();
        let prediction = clf.predict("good product").unwrap();
        assert_eq!(prediction.probs.len(), 2);
        assert!(matches!(prediction.score.get(), 1 | 5));
    }
}
