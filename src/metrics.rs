//! Request and prediction statistics for the classification service.

use crate::types::prediction::{Label, Prediction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the service
pub struct ServiceMetrics {
    /// Predictions returned to callers
    pub predictions_served: AtomicU64,
    /// Requests that ended in an error reply
    pub failures: AtomicU64,
    /// Normal labels forced to Fraudulent
    pub overrides: AtomicU64,
    /// Final labels served
    labels: RwLock<HashMap<Label, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Confidence distribution in 10-point buckets
    confidence_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            overrides: AtomicU64::new(0),
            labels: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            confidence_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully served prediction
    pub fn record_prediction(&self, prediction: &Prediction, processing_time: Duration) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);

        if prediction.was_overridden() {
            self.overrides.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut labels) = self.labels.write() {
            *labels.entry(prediction.label).or_insert(0) += 1;
        }

        self.record_time(processing_time);

        if let Some(confidence) = prediction.confidence {
            let bucket = ((confidence / 10.0) as usize).min(9);
            if let Ok(mut buckets) = self.confidence_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a request that failed
    pub fn record_failure(&self, processing_time: Duration) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted = times;
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.predictions_served.load(Ordering::Relaxed)
            + self.failures.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_label_counts(&self) -> HashMap<Label, u64> {
        self.labels.read().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn get_confidence_distribution(&self) -> [u64; 10] {
        self.confidence_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let overrides = self.overrides.load(Ordering::Relaxed);
        let override_rate = if served > 0 {
            (overrides as f64 / served as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let labels = self.get_label_counts();

        info!(
            served = served,
            failures = failures,
            overrides = overrides,
            override_rate = format!("{:.1}%", override_rate),
            throughput = format!("{:.2} req/s", self.get_throughput()),
            "Service metrics summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Processing time"
        );
        for label in [Label::Normal, Label::Loyal, Label::Fraudulent, Label::Unknown] {
            let count = labels.get(&label).copied().unwrap_or(0);
            if count > 0 {
                info!(label = %label, count = count, "Label count");
            }
        }

        let distribution = self.get_confidence_distribution();
        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
                info!("  confidence {:>3}-{:<3}: {:>6} ({:>5.1}%) {}", i * 10, (i + 1) * 10, count, pct, bar);
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::customer::FeatureVector;

    fn prediction(label: Label, confidence: Option<f64>, triggered: &[&str]) -> Prediction {
        Prediction {
            label,
            confidence,
            input: FeatureVector {
                age: 30,
                gender: "Female".to_string(),
                country: "USA".to_string(),
                avg_order_value: 50.0,
                total_orders: 10,
                days_since_last_purchase: 5,
                preferred_category: "Books".to_string(),
                email_open_rate: 0.6,
                loyalty_score: 80,
                churn_risk: 0.1,
            },
            triggered_rules: triggered.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(&prediction(Label::Normal, Some(91.0), &[]), Duration::from_micros(100));
        metrics.record_prediction(
            &prediction(Label::Fraudulent, Some(100.0), &["total_orders"]),
            Duration::from_micros(200),
        );
        metrics.record_prediction(&prediction(Label::Loyal, None, &[]), Duration::from_micros(300));
        metrics.record_failure(Duration::from_micros(50));

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.overrides.load(Ordering::Relaxed), 1);

        let labels = metrics.get_label_counts();
        assert_eq!(labels.get(&Label::Fraudulent), Some(&1));
        assert_eq!(labels.get(&Label::Normal), Some(&1));

        // 100.0 lands in the top bucket, missing confidence is not counted
        let distribution = metrics.get_confidence_distribution();
        assert_eq!(distribution[9], 2);
        assert_eq!(distribution.iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_failure(Duration::from_micros(us));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
