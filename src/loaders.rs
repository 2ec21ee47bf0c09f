//! Shared artifact loading: HuggingFace Hub files, tokenizers, and JSON
//! model artifacts exported by the offline training pipeline.

use std::path::{Path, PathBuf};

use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::de::DeserializeOwned;
use tokenizers::Tokenizer;

use crate::error::{Result, ServeError};

/// Fetches a single file from a Hub model repository, using the local
/// cache when present.
#[derive(Debug, Clone)]
pub(crate) struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let api = Api::new()?;
        let repo = api.repo(Repo::new(self.repo.clone(), RepoType::Model));
        repo.get(&self.filename).map_err(|e| {
            ServeError::Download(format!(
                "failed to fetch '{}' from '{}': {}",
                self.filename, self.repo, e
            ))
        })
    }
}

/// Loads a `tokenizers` tokenizer from a file on disk.
pub(crate) fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| {
        ServeError::Tokenization(format!(
            "failed to load tokenizer from '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Reads and deserializes a JSON artifact, reporting the offending path on
/// failure.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ServeError::Artifact(format!("failed to read '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        ServeError::Artifact(format!("failed to parse '{}': {}", path.display(), e))
    })
}

/// Resolves model weights under `dir`, preferring safetensors.
pub(crate) fn weights_path(dir: &Path) -> Result<PathBuf> {
    let safetensors = dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(safetensors);
    }
    let pth = dir.join("pytorch_model.bin");
    if pth.exists() {
        return Ok(pth);
    }
    Err(ServeError::Artifact(format!(
        "no model weights under '{}'",
        dir.display()
    )))
}
