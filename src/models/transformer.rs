//! Transformer review classifier: a pretrained BERT encoder with the
//! standard pooler and a 5-class sequence-classification head.
//!
//! Artifacts are taken from the local models directory when present and
//! otherwise resolved from the HuggingFace Hub. The encoder comes from
//! `candle_transformers`; the pooler and classification head are plain
//! linear layers loaded from the same checkpoint.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::{Prediction, ReviewClassifier};
use crate::error::{Result, ServeError};
use crate::loaders::{load_tokenizer, weights_path, HfLoader};
use crate::score::Score;
use crate::text::normalize;

const MAX_LEN: usize = 128;

/// Classifier head width when the checkpoint config names no labels.
const DEFAULT_NUM_LABELS: usize = 5;

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    label2id: HashMap<String, u32>,
}

struct ArtifactPaths {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

/// BERT review classifier with a native 5-way star-scale output.
pub struct TransformerClassifier {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl TransformerClassifier {
    /// Loads the classifier from `<dir>` when it holds a checkpoint,
    /// otherwise from the given Hub repository.
    pub fn load(dir: &Path, repo: &str, device: &Device) -> Result<Self> {
        let paths = resolve_artifacts(dir, repo)?;

        let config_str = std::fs::read_to_string(&paths.config)?;
        let config: Config = serde_json::from_str(&config_str)?;
        let num_labels = num_labels_from_config(&config_str);

        let mut tokenizer = load_tokenizer(&paths.tokenizer)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_LEN,
                ..Default::default()
            }))
            .map_err(|e| ServeError::Tokenization(format!("invalid truncation params: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(MAX_LEN),
            ..Default::default()
        }));

        let vb = if paths.weights.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[paths.weights], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(&paths.weights, DType::F32, device)?
        };

        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = candle_nn::linear(
            config.hidden_size,
            config.hidden_size,
            vb.pp("bert").pp("pooler").pp("dense"),
        )?;
        let classifier = candle_nn::linear(config.hidden_size, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            device: device.clone(),
        })
    }
}

impl ReviewClassifier for TransformerClassifier {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let normalized = normalize(text);
        let encoding = self.tokenizer.encode(normalized, true).map_err(|e| {
            ServeError::Tokenization(format!(
                "tokenization failed on '{}': {}",
                text.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let sequence_output =
            self.bert
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // CLS token -> pooler -> tanh, the standard BERT pooling.
        let cls = sequence_output.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;

        let probs = softmax(&logits, D::Minus1)?;
        let class = logits.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()?;
        let probs_vec = probs.squeeze(0)?.to_vec1::<f32>()?;

        Ok(Prediction {
            score: Score::from_five_class(class as usize),
            probs: probs_vec,
        })
    }
}

fn resolve_artifacts(dir: &Path, repo: &str) -> Result<ArtifactPaths> {
    if dir.join("config.json").exists() {
        return Ok(ArtifactPaths {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: weights_path(dir)?,
        });
    }
    Ok(ArtifactPaths {
        config: HfLoader::new(repo, "config.json").load()?,
        tokenizer: HfLoader::new(repo, "tokenizer.json").load()?,
        weights: HfLoader::new(repo, "model.safetensors")
            .load()
            .or_else(|_| HfLoader::new(repo, "pytorch_model.bin").load())?,
    })
}

/// Head width from the checkpoint's label maps, falling back to the
/// 5-class star scale.
fn num_labels_from_config(config_str: &str) -> usize {
    let labels: ClassifierConfigJson = serde_json::from_str(config_str).unwrap_or_else(|_| {
        ClassifierConfigJson {
            id2label: HashMap::new(),
            label2id: HashMap::new(),
        }
    });
    let num = labels.id2label.len().max(labels.label2id.len());
    if num == 0 {
        DEFAULT_NUM_LABELS
    } else {
        num
    }
}
