//! Request pipeline: Feature Deriver -> Inference Engine -> History Store.
//!
//! A failure at any stage fails the whole request. Nothing is written to the
//! history for a failed prediction, and a failed history write is reported
//! to the caller instead of the prediction.

use crate::config::AppConfig;
use crate::feature_deriver::FeatureDeriver;
use crate::history::HistoryStore;
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::customer::{CustomerRecord, FeatureVector};
use crate::types::prediction::{ErrorResponse, Prediction, Reply};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Stateless per request; the history file is the only shared mutable state.
pub struct PredictionService {
    deriver: FeatureDeriver,
    engine: InferenceEngine,
    history: HistoryStore,
    metrics: Arc<ServiceMetrics>,
}

impl PredictionService {
    pub fn new(engine: InferenceEngine, history: HistoryStore, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            deriver: FeatureDeriver::new(),
            engine,
            history,
            metrics,
        }
    }

    /// Build the full pipeline from configuration, loading the classifier once
    pub fn from_config(config: &AppConfig, metrics: Arc<ServiceMetrics>) -> Result<Self> {
        let engine = InferenceEngine::from_config(config)?;
        let history = HistoryStore::new(config.history.path.clone());
        info!(history = %history.path().display(), "Prediction history configured");
        Ok(Self::new(engine, history, metrics))
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Classify a record and persist the result
    pub fn predict(&self, record: &CustomerRecord) -> Result<Prediction> {
        let features = self.deriver.derive(record);
        self.classify_and_record(features)
    }

    /// Same as [`predict`](Self::predict) with an explicit derivation date
    pub fn predict_at(&self, record: &CustomerRecord, today: NaiveDate) -> Result<Prediction> {
        let features = self.deriver.derive_at(record, today);
        self.classify_and_record(features)
    }

    fn classify_and_record(&self, features: FeatureVector) -> Result<Prediction> {
        let prediction = self.engine.predict(&features)?;
        self.history
            .append(&prediction)
            .context("Failed to record prediction history")?;
        Ok(prediction)
    }

    /// Request boundary: any error becomes a generic failure reply
    pub fn handle(&self, record: &CustomerRecord) -> Reply {
        let start = Instant::now();
        debug!(record = ?record, "Received customer record");

        match self.predict(record) {
            Ok(prediction) => {
                let elapsed = start.elapsed();
                self.metrics.record_prediction(&prediction, elapsed);
                info!(
                    label = %prediction.label,
                    confidence = ?prediction.confidence,
                    overridden = prediction.was_overridden(),
                    processing_time_us = elapsed.as_micros(),
                    "Prediction served"
                );
                Reply::Prediction(prediction)
            }
            Err(e) => {
                self.metrics.record_failure(start.elapsed());
                error!(error = %format!("{:#}", e), "Prediction failed");
                Reply::Error(ErrorResponse::internal(&e))
            }
        }
    }

    /// Decode a raw request payload and handle it
    pub fn handle_payload(&self, payload: &[u8]) -> Reply {
        let span = info_span!("request", request_id = %Uuid::new_v4());
        let _enter = span.enter();
        let start = Instant::now();

        match serde_json::from_slice::<CustomerRecord>(payload) {
            Ok(record) => self.handle(&record),
            Err(e) => {
                self.metrics.record_failure(start.elapsed());
                warn!(error = %e, "Failed to deserialize customer record");
                Reply::Error(ErrorResponse::invalid_request(e.to_string()))
            }
        }
    }
}
