//! Type definitions for the customer classification service

pub mod customer;
pub mod prediction;

pub use customer::{CustomerRecord, FeatureVector};
pub use prediction::{ErrorResponse, HistoryEntry, Label, Prediction, Reply};
