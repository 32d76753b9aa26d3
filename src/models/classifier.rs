//! Black-box classifier interface

use crate::types::customer::FeatureVector;
use anyhow::Result;

/// A pre-trained classifier consumed as an opaque component.
///
/// `predict` is always available. `predict_proba` is an optional capability:
/// implementations without class probabilities keep the default, which
/// reports the capability as absent with `Ok(None)`.
///
/// Implementations are loaded once and shared read-only across requests.
pub trait Classifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Category code for the features
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Per-class probability vector, if the classifier exposes one
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Option<Vec<f64>>> {
        Ok(None)
    }

    /// Category code and probabilities from one logical prediction.
    ///
    /// Backends that produce both in a single pass should override this so
    /// the label and its probabilities come from the same run.
    fn predict_with_proba(&self, features: &FeatureVector) -> Result<(i64, Option<Vec<f64>>)> {
        let code = self.predict(features)?;
        let probabilities = self.predict_proba(features)?;
        Ok((code, probabilities))
    }
}

/// Deterministic stand-in for the trained artifact.
///
/// Applies the labeling rule the offline training job uses for records
/// without a fraud flag: loyal at or above the loyalty cutoff, normal
/// otherwise. It never predicts fraud on its own and has no probabilities.
#[derive(Debug, Clone)]
pub struct BaselineClassifier {
    loyalty_cutoff: i32,
}

impl BaselineClassifier {
    pub fn new() -> Self {
        Self { loyalty_cutoff: 70 }
    }
}

impl Default for BaselineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for BaselineClassifier {
    fn name(&self) -> &str {
        "baseline"
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        if features.loyalty_score >= self.loyalty_cutoff {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features_with_loyalty(loyalty_score: i32) -> FeatureVector {
        FeatureVector {
            age: 34,
            gender: "Female".to_string(),
            country: "USA".to_string(),
            avg_order_value: 120.0,
            total_orders: 25,
            days_since_last_purchase: 3,
            preferred_category: "Apparel".to_string(),
            email_open_rate: 0.95,
            loyalty_score,
            churn_risk: 0.02,
        }
    }

    #[test]
    fn test_baseline_cutoff() {
        let classifier = BaselineClassifier::new();
        assert_eq!(classifier.predict(&features_with_loyalty(92)).unwrap(), 1);
        assert_eq!(classifier.predict(&features_with_loyalty(70)).unwrap(), 1);
        assert_eq!(classifier.predict(&features_with_loyalty(69)).unwrap(), 0);
    }

    #[test]
    fn test_baseline_has_no_probabilities() {
        let classifier = BaselineClassifier::new();
        assert!(classifier
            .predict_proba(&features_with_loyalty(50))
            .unwrap()
            .is_none());
    }
}
