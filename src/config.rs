//! Environment-driven service configuration.

use std::path::PathBuf;

use candle_core::Device;

use crate::error::{Result, ServeError};

/// Default HuggingFace Hub repository for the transformer classifier.
pub const DEFAULT_TRANSFORMER_REPO: &str = "nlptown/bert-base-multilingual-uncased-sentiment";

/// Which device inference should run on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    /// CPU inference (default).
    #[default]
    Cpu,
    /// A specific CUDA GPU.
    Cuda(usize),
}

impl DeviceRequest {
    /// Parses a device string: `cpu`, `cuda`, or `cuda:<index>`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim().to_lowercase();
        match value.as_str() {
            "cpu" => Ok(DeviceRequest::Cpu),
            "cuda" => Ok(DeviceRequest::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(index) => index
                    .parse()
                    .map(DeviceRequest::Cuda)
                    .map_err(|_| ServeError::Config(format!("invalid CUDA index in '{other}'"))),
                None => Err(ServeError::Config(format!("unknown device '{other}'"))),
            },
        }
    }

    /// Resolves the request into a candle [`Device`].
    pub fn resolve(&self) -> Result<Device> {
        match self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(index) => Device::new_cuda(*index).map_err(|e| {
                ServeError::Device(format!(
                    "failed to init CUDA device {index}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

/// Service configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Socket address the HTTP server binds to.
    pub addr: String,
    /// Directory holding the per-model artifact subdirectories
    /// (`linear/`, `recurrent/`, `transformer/`).
    pub models_dir: PathBuf,
    /// Device the candle-backed classifiers run on.
    pub device: DeviceRequest,
    /// Hub repository to resolve the transformer from when no local
    /// artifacts are present.
    pub transformer_repo: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            models_dir: PathBuf::from("models"),
            device: DeviceRequest::Cpu,
            transformer_repo: DEFAULT_TRANSFORMER_REPO.to_string(),
        }
    }
}

impl ServeConfig {
    /// Builds the configuration from `REVIEW_SERVE_*` environment
    /// variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let device = match std::env::var("REVIEW_SERVE_DEVICE") {
            Ok(value) => DeviceRequest::parse(&value)?,
            Err(_) => defaults.device,
        };
        Ok(Self {
            addr: std::env::var("REVIEW_SERVE_ADDR").unwrap_or(defaults.addr),
            models_dir: std::env::var("REVIEW_SERVE_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            device,
            transformer_repo: std::env::var("REVIEW_SERVE_TRANSFORMER_REPO")
                .unwrap_or(defaults.transformer_repo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceRequest;

    #[test]
    fn parses_device_strings() {
        assert_eq!(DeviceRequest::parse("cpu").unwrap(), DeviceRequest::Cpu);
        assert_eq!(DeviceRequest::parse("CUDA").unwrap(), DeviceRequest::Cuda(0));
        assert_eq!(
            DeviceRequest::parse(" cuda:2 ").unwrap(),
            DeviceRequest::Cuda(2)
        );
        assert!(DeviceRequest::parse("tpu").is_err());
        assert!(DeviceRequest::parse("cuda:x").is_err());
    }
}
