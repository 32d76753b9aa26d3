//! Prediction results, persisted history entries and reply payloads

use crate::types::customer::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral category assigned to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Loyal,
    Fraudulent,
    /// Classifier returned a code outside the known table. Only reachable with
    /// an artifact trained on a different label set.
    Unknown,
}

impl Label {
    /// Map a classifier category code to a label
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Label::Normal,
            1 => Label::Loyal,
            2 => Label::Fraudulent,
            _ => Label::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "Normal",
            Label::Loyal => "Loyal",
            Label::Fraudulent => "Fraudulent",
            Label::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final classification returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Final label, after the suspicious-activity override
    pub label: Label,

    /// Highest class probability as a percentage with two decimals,
    /// `None` when the classifier exposes no probabilities
    pub confidence: Option<f64>,

    /// Features the classifier was given
    pub input: FeatureVector,

    /// Override conditions that forced a `Normal` label to `Fraudulent`
    #[serde(skip)]
    pub triggered_rules: Vec<String>,
}

impl Prediction {
    /// Whether the override rule changed the classifier's label
    pub fn was_overridden(&self) -> bool {
        !self.triggered_rules.is_empty()
    }
}

/// One element of the persisted prediction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub prediction: Prediction,

    /// Instant the entry was appended
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Stamp a prediction with the current time
    pub fn new(prediction: Prediction) -> Self {
        Self {
            prediction,
            timestamp: Utc::now(),
        }
    }
}

/// Failure reply sent in place of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub detail: String,
}

impl ErrorResponse {
    /// Any failure inside derivation, inference or persistence
    pub fn internal(error: &anyhow::Error) -> Self {
        Self {
            status: 500,
            detail: format!("{:#}", error),
        }
    }

    /// Payload could not be decoded as a customer record
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self {
            status: 422,
            detail: detail.into(),
        }
    }
}

/// Reply payload published back to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Prediction(Prediction),
    Error(ErrorResponse),
}
