//! The common 1-5 review score and the sentiment label derived from it.
//!
//! Every classifier reports its prediction on a different native scale
//! (5-way zero-based classes, or a coarse binary verdict). The constructors
//! here are the only places those native scales are mapped onto the shared
//! score, so the mapping stays explicit and auditable.

use serde::{Deserialize, Serialize};

/// A review score, always within `1..=5` regardless of the native class
/// count of the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Maps a zero-based 5-way class index (`0..=4`) to a score, clamping
    /// to `1..=5`. Used by the linear and transformer classifiers, whose
    /// native classes already mirror the star scale.
    pub fn from_five_class(class: usize) -> Self {
        Score((class as u8).saturating_add(1).clamp(1, 5))
    }

    /// Maps a binary class to the extremes of the scale: `0` (negative)
    /// becomes 1, anything else becomes 5.
    ///
    /// This is the recurrent model's coarse binary-to-5-point mapping; it
    /// discards the intermediate scores by construction.
    pub fn from_binary(class: usize) -> Self {
        if class == 0 {
            Score(1)
        } else {
            Score(5)
        }
    }

    /// The score value in `1..=5`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The three-bucket sentiment label for this score.
    pub fn sentiment(self) -> Sentiment {
        match self.0 {
            0..=2 => Sentiment::Negative,
            3 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        }
    }
}

/// Three-bucket sentiment label derived from a [`Score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Score 1 or 2.
    Negative,
    /// Score 3.
    Neutral,
    /// Score 4 or 5.
    Positive,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        };
        write!(f, "{name}")
    }
}
