//! The model registry: every classifier the service can dispatch to,
//! loaded once at startup and read-only afterwards.
//!
//! Each slot is explicitly ready or unavailable. A classifier that fails
//! to load leaves its reason behind in the slot, visible through the
//! health endpoint and returned as a typed error on dispatch; it never
//! prevents the other classifiers from loading or the process from
//! serving.

use std::collections::HashMap;

use candle_core::Device;
use tracing::{info, warn};

use crate::config::ServeConfig;
use crate::error::{Result, ServeError};
use crate::models::{
    LinearClassifier, RecurrentClassifier, ReviewClassifier, TransformerClassifier,
};

/// The three served models, keyed by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Linear bag-of-words classifier (`logreg`).
    LogReg,
    /// Recurrent network classifier (`lstm`).
    Lstm,
    /// Transformer classifier (`bert`).
    Bert,
}

impl ModelKind {
    /// All served models, in presentation order.
    pub const ALL: [ModelKind; 3] = [ModelKind::LogReg, ModelKind::Lstm, ModelKind::Bert];

    /// The wire key clients select this model with.
    pub fn key(self) -> &'static str {
        match self {
            ModelKind::LogReg => "logreg",
            ModelKind::Lstm => "lstm",
            ModelKind::Bert => "bert",
        }
    }

    /// Human-readable description for the service metadata endpoint.
    pub fn description(self) -> &'static str {
        match self {
            ModelKind::LogReg => "Logistic regression over tf-idf features",
            ModelKind::Lstm => "Recurrent LSTM network",
            ModelKind::Bert => "BERT transformer",
        }
    }

    /// Parses a client-supplied selector, case-insensitively and ignoring
    /// surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "logreg" => Some(ModelKind::LogReg),
            "lstm" => Some(ModelKind::Lstm),
            "bert" => Some(ModelKind::Bert),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

enum ModelSlot {
    Ready(Box<dyn ReviewClassifier>),
    Unavailable { reason: String },
}

/// Immutable set of loaded classifiers, keyed by [`ModelKind`].
pub struct ModelRegistry {
    slots: HashMap<ModelKind, ModelSlot>,
}

impl ModelRegistry {
    /// Loads all classifiers from the configured artifact layout. Slots
    /// whose artifacts are missing or broken come up unavailable; the
    /// registry itself always constructs.
    pub fn load(config: &ServeConfig, device: &Device) -> Self {
        let mut builder = Self::builder();

        let linear_dir = config.models_dir.join("linear");
        builder = match LinearClassifier::load(&linear_dir) {
            Ok(classifier) => builder.classifier(ModelKind::LogReg, Box::new(classifier)),
            Err(e) => builder.unavailable(ModelKind::LogReg, e.to_string()),
        };

        let recurrent_dir = config.models_dir.join("recurrent");
        builder = match RecurrentClassifier::load(&recurrent_dir, device) {
            Ok(classifier) => builder.classifier(ModelKind::Lstm, Box::new(classifier)),
            Err(e) => builder.unavailable(ModelKind::Lstm, e.to_string()),
        };

        let transformer_dir = config.models_dir.join("transformer");
        builder = match TransformerClassifier::load(
            &transformer_dir,
            &config.transformer_repo,
            device,
        ) {
            Ok(classifier) => builder.classifier(ModelKind::Bert, Box::new(classifier)),
            Err(e) => builder.unavailable(ModelKind::Bert, e.to_string()),
        };

        let registry = builder.build();
        for kind in ModelKind::ALL {
            match registry.slots.get(&kind) {
                Some(ModelSlot::Ready(_)) => info!(model = kind.key(), "model loaded"),
                Some(ModelSlot::Unavailable { reason }) => {
                    warn!(model = kind.key(), %reason, "model unavailable");
                }
                None => {}
            }
        }
        registry
    }

    /// Starts an empty registry builder. Models not configured on the
    /// builder come up unavailable.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            slots: HashMap::new(),
        }
    }

    /// The classifier for `kind`, or a [`ServeError::ModelUnavailable`]
    /// carrying the load-time reason.
    pub fn get(&self, kind: ModelKind) -> Result<&dyn ReviewClassifier> {
        match self.slots.get(&kind) {
            Some(ModelSlot::Ready(classifier)) => Ok(classifier.as_ref()),
            Some(ModelSlot::Unavailable { reason }) => Err(ServeError::ModelUnavailable {
                model: kind.key(),
                reason: reason.clone(),
            }),
            None => Err(ServeError::ModelUnavailable {
                model: kind.key(),
                reason: "not configured".to_string(),
            }),
        }
    }

    /// Whether the classifier for `kind` is ready to serve.
    pub fn is_available(&self, kind: ModelKind) -> bool {
        matches!(self.slots.get(&kind), Some(ModelSlot::Ready(_)))
    }
}

/// Builder assembling a [`ModelRegistry`] from arbitrary classifiers.
/// Used by the loader and by tests that stub out inference.
pub struct RegistryBuilder {
    slots: HashMap<ModelKind, ModelSlot>,
}

impl RegistryBuilder {
    /// Marks `kind` ready, served by `classifier`.
    pub fn classifier(mut self, kind: ModelKind, classifier: Box<dyn ReviewClassifier>) -> Self {
        self.slots.insert(kind, ModelSlot::Ready(classifier));
        self
    }

    /// Marks `kind` unavailable with a reason.
    pub fn unavailable(mut self, kind: ModelKind, reason: impl Into<String>) -> Self {
        self.slots.insert(
            kind,
            ModelSlot::Unavailable {
                reason: reason.into(),
            },
        );
        self
    }

    /// Finalizes the registry. Any model kind never mentioned becomes
    /// unavailable.
    pub fn build(mut self) -> ModelRegistry {
        for kind in ModelKind::ALL {
            self.slots.entry(kind).or_insert(ModelSlot::Unavailable {
                reason: "not configured".to_string(),
            });
        }
        ModelRegistry { slots: self.slots }
    }
}
