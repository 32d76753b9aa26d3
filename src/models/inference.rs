//! Inference and override engine

use crate::config::{AppConfig, ClassifierKind};
use crate::models::classifier::{BaselineClassifier, Classifier};
use crate::models::encoding::FeatureEncoder;
use crate::models::onnx::OnnxClassifier;
use crate::models::rules::SuspicionThresholds;
use crate::types::customer::FeatureVector;
use crate::types::prediction::{Label, Prediction};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the black-box classifier and applies the suspicious-activity override.
///
/// The classifier is injected once at construction and shared read-only.
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    rules: SuspicionThresholds,
}

impl InferenceEngine {
    pub fn new(classifier: Arc<dyn Classifier>, rules: SuspicionThresholds) -> Self {
        Self { classifier, rules }
    }

    /// Create the engine with the classifier backend named in configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let classifier: Arc<dyn Classifier> = match config.model.kind {
            ClassifierKind::Onnx => Arc::new(
                OnnxClassifier::load(
                    &config.model.path,
                    FeatureEncoder::from_config(&config.model),
                    config.model.onnx_threads,
                )
                .context("Failed to load classifier artifact")?,
            ),
            ClassifierKind::Baseline => Arc::new(BaselineClassifier::new()),
        };

        info!(
            classifier = %classifier.name(),
            rules = ?config.rules,
            "Inference engine initialized"
        );

        Ok(Self::new(classifier, config.rules.clone()))
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn rules(&self) -> &SuspicionThresholds {
        &self.rules
    }

    /// Classify a feature vector.
    ///
    /// Fails only if the classifier does; no partial result is produced.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let (code, probabilities) = self
            .classifier
            .predict_with_proba(features)
            .context("Classifier prediction failed")?;

        let base_label = Label::from_code(code);
        if base_label == Label::Unknown {
            warn!(code = code, classifier = %self.classifier.name(), "Classifier returned unknown category code");
        }

        let confidence = probabilities
            .as_deref()
            .and_then(confidence_from_probabilities);

        let mut label = base_label;
        let mut triggered_rules = Vec::new();

        // Only Normal is second-guessed; Loyal and Fraudulent stand
        if base_label == Label::Normal {
            let triggered = self.rules.triggered(features);
            if !triggered.is_empty() {
                info!(
                    triggered = ?triggered,
                    confidence = ?confidence,
                    "Suspicious activity, overriding Normal to Fraudulent"
                );
                label = Label::Fraudulent;
                triggered_rules = triggered.into_iter().map(String::from).collect();
            }
        }

        debug!(
            classifier = %self.classifier.name(),
            code = code,
            base_label = %base_label,
            label = %label,
            confidence = ?confidence,
            "Inference complete"
        );

        Ok(Prediction {
            label,
            confidence,
            input: features.clone(),
            triggered_rules,
        })
    }
}

/// Highest class probability as a percentage rounded to two decimals.
///
/// Returns `None` for an empty or entirely non-finite vector. Components are
/// clamped into [0, 1] first so the result always lies in [0, 100].
pub fn confidence_from_probabilities(probabilities: &[f64]) -> Option<f64> {
    let max = probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))))?;

    let percent = max.clamp(0.0, 1.0) * 100.0;
    Some((percent * 100.0).round() / 100.0)
}
