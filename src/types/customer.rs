//! Customer record and derived feature vector

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw customer record as received from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Age in years
    pub age: u32,

    pub gender: String,

    pub country: String,

    /// Average order value
    pub avg_order_value: f64,

    /// Lifetime number of orders
    pub total_orders: u32,

    /// Date of the most recent purchase (YYYY-MM-DD)
    pub last_purchase: NaiveDate,

    pub preferred_category: String,

    /// Marketing email open rate, expected in [0, 1]
    pub email_open_rate: f64,

    /// Loyalty score, expected in [0, 100]
    pub loyalty_score: i32,

    /// Churn risk, expected in [0, 1]
    pub churn_risk: f64,
}

/// Classifier input: the customer record with `last_purchase` replaced by a
/// day count relative to the derivation date.
///
/// The day count keeps the `last_purchase` key on the wire, which is the
/// column name the classifier was trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age: u32,
    pub gender: String,
    pub country: String,
    pub avg_order_value: f64,
    pub total_orders: u32,
    /// Whole days since the last purchase; negative for future dates
    #[serde(rename = "last_purchase")]
    pub days_since_last_purchase: i64,
    pub preferred_category: String,
    pub email_open_rate: f64,
    pub loyalty_score: i32,
    pub churn_risk: f64,
}

impl CustomerRecord {
    /// Create a record with neutral defaults, used for tests and sample data
    pub fn new(age: u32, last_purchase: NaiveDate) -> Self {
        Self {
            age,
            gender: "Other".to_string(),
            country: "USA".to_string(),
            avg_order_value: 50.0,
            total_orders: 10,
            last_purchase,
            preferred_category: "Books".to_string(),
            email_open_rate: 0.6,
            loyalty_score: 50,
            churn_risk: 0.1,
        }
    }
}
