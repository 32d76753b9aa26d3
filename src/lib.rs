//! Customer Classification Service Library
//!
//! Classifies e-commerce customers as Normal, Loyal or Fraudulent with a
//! pre-trained classifier, overrides suspicious Normal labels, and keeps a
//! durable history of every prediction.

pub mod config;
pub mod consumer;
pub mod feature_deriver;
pub mod history;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use feature_deriver::FeatureDeriver;
pub use history::HistoryStore;
pub use models::inference::InferenceEngine;
pub use producer::ReplyPublisher;
pub use service::PredictionService;
pub use types::{customer::CustomerRecord, prediction::Prediction};
