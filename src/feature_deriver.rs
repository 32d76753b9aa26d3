//! Feature derivation for classifier input.
//!
//! Turns a raw customer record into the flat feature set the classifier was
//! trained on. The only transformation is replacing the absolute
//! `last_purchase` date with a day count relative to "today".

use crate::types::customer::{CustomerRecord, FeatureVector};
use chrono::{Local, NaiveDate};

/// Derives classifier features from customer records.
///
/// Values are passed through without range checks; out-of-range inputs reach
/// the classifier as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derive features using the local calendar date at invocation time.
    pub fn derive(&self, record: &CustomerRecord) -> FeatureVector {
        self.derive_at(record, Local::now().date_naive())
    }

    /// Derive features relative to an explicit `today`.
    ///
    /// A `last_purchase` after `today` yields a negative day count.
    pub fn derive_at(&self, record: &CustomerRecord, today: NaiveDate) -> FeatureVector {
        FeatureVector {
            age: record.age,
            gender: record.gender.clone(),
            country: record.country.clone(),
            avg_order_value: record.avg_order_value,
            total_orders: record.total_orders,
            days_since_last_purchase: (today - record.last_purchase).num_days(),
            preferred_category: record.preferred_category.clone(),
            email_open_rate: record.email_open_rate,
            loyalty_score: record.loyalty_score,
            churn_risk: record.churn_risk,
        }
    }
}
