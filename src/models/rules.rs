//! Suspicious-activity override rule.
//!
//! The classifier under-reports fraud among records it labels `Normal`. Any
//! record labelled `Normal` that trips one of these thresholds is relabelled
//! `Fraudulent`, trading precision for recall.

use crate::types::customer::FeatureVector;
use serde::{Deserialize, Serialize};

/// Thresholds for the override rule. A record is suspicious if ANY holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionThresholds {
    /// Suspicious when `avg_order_value` is strictly above this
    pub max_avg_order_value: f64,
    /// Suspicious when `churn_risk` is strictly above this
    pub max_churn_risk: f64,
    /// Suspicious when `loyalty_score` is strictly below this
    pub min_loyalty_score: i32,
    /// Suspicious when `email_open_rate` is strictly below this
    pub min_email_open_rate: f64,
    /// Suspicious when `total_orders` is at or below this
    pub min_total_orders: u32,
}

impl Default for SuspicionThresholds {
    fn default() -> Self {
        Self {
            max_avg_order_value: 1000.0,
            max_churn_risk: 0.8,
            min_loyalty_score: 20,
            min_email_open_rate: 0.2,
            min_total_orders: 3,
        }
    }
}

impl SuspicionThresholds {
    /// Names of the conditions the features trip, in a fixed order.
    ///
    /// Evaluated against the derived feature values, never the classifier's
    /// internal (scaled or encoded) representation.
    pub fn triggered(&self, features: &FeatureVector) -> Vec<&'static str> {
        let checks = [
            (
                "avg_order_value",
                features.avg_order_value > self.max_avg_order_value,
            ),
            ("churn_risk", features.churn_risk > self.max_churn_risk),
            (
                "loyalty_score",
                features.loyalty_score < self.min_loyalty_score,
            ),
            (
                "email_open_rate",
                features.email_open_rate < self.min_email_open_rate,
            ),
            ("total_orders", features.total_orders <= self.min_total_orders),
        ];

        checks
            .iter()
            .filter(|(_, hit)| *hit)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_suspicious(&self, features: &FeatureVector) -> bool {
        !self.triggered(features).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_features() -> FeatureVector {
        FeatureVector {
            age: 30,
            gender: "Female".to_string(),
            country: "USA".to_string(),
            avg_order_value: 50.0,
            total_orders: 10,
            days_since_last_purchase: 12,
            preferred_category: "Books".to_string(),
            email_open_rate: 0.6,
            loyalty_score: 80,
            churn_risk: 0.1,
        }
    }

    #[test]
    fn test_clean_record_not_suspicious() {
        let rules = SuspicionThresholds::default();
        assert!(rules.triggered(&clean_features()).is_empty());
        assert!(!rules.is_suspicious(&clean_features()));
    }

    #[test]
    fn test_each_condition_triggers_alone() {
        let rules = SuspicionThresholds::default();

        let mut f = clean_features();
        f.avg_order_value = 1500.0;
        assert_eq!(rules.triggered(&f), vec!["avg_order_value"]);

        let mut f = clean_features();
        f.churn_risk = 0.81;
        assert_eq!(rules.triggered(&f), vec!["churn_risk"]);

        let mut f = clean_features();
        f.loyalty_score = 19;
        assert_eq!(rules.triggered(&f), vec!["loyalty_score"]);

        let mut f = clean_features();
        f.email_open_rate = 0.19;
        assert_eq!(rules.triggered(&f), vec!["email_open_rate"]);

        let mut f = clean_features();
        f.total_orders = 3;
        assert_eq!(rules.triggered(&f), vec!["total_orders"]);
    }

    #[test]
    fn test_boundaries() {
        let rules = SuspicionThresholds::default();

        // Strict comparisons sit exactly on the threshold without tripping
        let mut f = clean_features();
        f.avg_order_value = 1000.0;
        f.churn_risk = 0.8;
        f.loyalty_score = 20;
        f.email_open_rate = 0.2;
        f.total_orders = 4;
        assert!(!rules.is_suspicious(&f));

        // total_orders is inclusive
        f.total_orders = 3;
        assert!(rules.is_suspicious(&f));
    }

    #[test]
    fn test_multiple_conditions_reported_in_order() {
        let rules = SuspicionThresholds::default();
        let mut f = clean_features();
        f.total_orders = 1;
        f.avg_order_value = 5000.0;
        f.loyalty_score = 5;

        assert_eq!(
            rules.triggered(&f),
            vec!["avg_order_value", "loyalty_score", "total_orders"]
        );
    }
}
