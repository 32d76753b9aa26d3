//! Dense encoding of feature vectors for tensor-based classifiers.
//!
//! Layout: the seven numeric columns in training order, followed by one-hot
//! blocks for gender, country and preferred category. A category missing from
//! its vocabulary encodes as an all-zero block.

use crate::config::ModelConfig;
use crate::types::customer::FeatureVector;

/// Numeric columns in the order the classifier was trained on
pub const NUMERIC_FEATURES: [&str; 7] = [
    "age",
    "avg_order_value",
    "total_orders",
    "last_purchase",
    "email_open_rate",
    "loyalty_score",
    "churn_risk",
];

/// Encodes feature vectors into the flat `f32` row a tensor model expects.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    genders: Vec<String>,
    countries: Vec<String>,
    categories: Vec<String>,
}

impl FeatureEncoder {
    pub fn new(genders: Vec<String>, countries: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            genders,
            countries,
            categories,
        }
    }

    /// Build an encoder from the model's configured vocabularies
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.genders.clone(),
            config.countries.clone(),
            config.categories.clone(),
        )
    }

    /// Length of an encoded row
    pub fn feature_count(&self) -> usize {
        NUMERIC_FEATURES.len() + self.genders.len() + self.countries.len() + self.categories.len()
    }

    /// Column names of an encoded row
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect();
        names.extend(self.genders.iter().map(|v| format!("gender_{}", v)));
        names.extend(self.countries.iter().map(|v| format!("country_{}", v)));
        names.extend(
            self.categories
                .iter()
                .map(|v| format!("preferred_category_{}", v)),
        );
        names
    }

    /// Encode a feature vector
    pub fn encode(&self, features: &FeatureVector) -> Vec<f32> {
        let mut row = Vec::with_capacity(self.feature_count());

        row.push(features.age as f32);
        row.push(features.avg_order_value as f32);
        row.push(features.total_orders as f32);
        row.push(features.days_since_last_purchase as f32);
        row.push(features.email_open_rate as f32);
        row.push(features.loyalty_score as f32);
        row.push(features.churn_risk as f32);

        push_one_hot(&mut row, &self.genders, &features.gender);
        push_one_hot(&mut row, &self.countries, &features.country);
        push_one_hot(&mut row, &self.categories, &features.preferred_category);

        row
    }
}

fn push_one_hot(row: &mut Vec<f32>, vocabulary: &[String], value: &str) {
    row.extend(
        vocabulary
            .iter()
            .map(|known| if known == value { 1.0 } else { 0.0 }),
    );
}
