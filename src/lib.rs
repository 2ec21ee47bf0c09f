//! HTTP serving façade over three pretrained review sentiment classifiers.
//!
//! Three independent classifiers — a linear bag-of-words model, a recurrent
//! LSTM network, and a BERT transformer — are loaded once at startup into an
//! immutable [`registry::ModelRegistry`] and dispatched to by name per
//! request. Their heterogeneous native outputs are normalized onto one 1-5
//! [`score::Score`] with a derived three-way [`score::Sentiment`], while each
//! model's native probability vector is passed through untouched.
//!
//! Model training, tokenizer construction, and weight files are produced
//! outside this crate; the classifiers here are inference-only adapters over
//! exported artifacts.

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;

// ============ Public API ============

pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod score;
pub mod server;
pub mod text;

pub use config::ServeConfig;
pub use registry::{ModelKind, ModelRegistry};
pub use score::{Score, Sentiment};
pub use server::{create_router, AppState};
