//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`ServeError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`ServeError`] as the error type.
pub type Result<T> = std::result::Result<T, ServeError>;

/// The unified error type for all crate errors.
///
/// Validation variants ([`ServeError::EmptyText`], [`ServeError::UnknownModel`],
/// [`ServeError::EmptyBatch`]) map to client errors at the HTTP boundary,
/// [`ServeError::ModelUnavailable`] to a service-unavailable response, and
/// everything else to an internal error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServeError {
    /// The request text was empty or whitespace-only.
    #[error("text must not be empty")]
    EmptyText,

    /// The batch request contained no reviews.
    #[error("at least one review is required")]
    EmptyBatch,

    /// The requested model name is not one of the served models.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The requested model failed to load at startup and cannot serve.
    #[error("model '{model}' is unavailable: {reason}")]
    ModelUnavailable {
        /// Wire key of the model.
        model: &'static str,
        /// Why the model did not load.
        reason: String,
    },

    /// Invalid or unreadable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A model artifact was missing or malformed at load time.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Network or download failure while resolving model files.
    #[error("download failed: {0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("device error: {0}")]
    Device(String),

    /// Inference failure inside a model adapter.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<hf_hub::api::sync::ApiError> for ServeError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        ServeError::Download(value.to_string())
    }
}

impl From<candle_core::Error> for ServeError {
    fn from(value: candle_core::Error) -> Self {
        ServeError::Inference(value.to_string())
    }
}

impl From<std::io::Error> for ServeError {
    fn from(value: std::io::Error) -> Self {
        ServeError::Artifact(value.to_string())
    }
}

impl From<serde_json::Error> for ServeError {
    fn from(value: serde_json::Error) -> Self {
        ServeError::Artifact(value.to_string())
    }
}
