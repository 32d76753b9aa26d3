//! Configuration management for the customer classification service

use crate::models::rules::SuspicionThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Classifier backend
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Pre-trained ONNX artifact
    #[default]
    Onnx,
    /// Deterministic loyalty-score rule, no artifact needed
    Baseline,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub rules: SuspicionThresholds,
    #[serde(default)]
    pub history: HistoryConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Queue group, so several instances can share the subject
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ClassifierKind,
    /// Path to the ONNX artifact
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// One-hot vocabulary for `gender`
    #[serde(default)]
    pub genders: Vec<String>,
    /// One-hot vocabulary for `country`
    #[serde(default)]
    pub countries: Vec<String>,
    /// One-hot vocabulary for `preferred_category`
    #[serde(default)]
    pub categories: Vec<String>,
}

fn default_model_path() -> String {
    "model/classifier.onnx".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Prediction history configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// History file, relative paths resolve from the working directory
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("prediction_history.json"),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests processed concurrently
    pub workers: usize,
    /// Interval between metrics summaries in seconds
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "customers.predict".to_string(),
                queue_group: None,
            },
            model: ModelConfig {
                kind: ClassifierKind::Onnx,
                path: default_model_path(),
                onnx_threads: default_onnx_threads(),
                genders: vec![
                    "Female".to_string(),
                    "Male".to_string(),
                    "Other".to_string(),
                ],
                countries: Vec::new(),
                categories: Vec::new(),
            },
            rules: SuspicionThresholds::default(),
            history: HistoryConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "customers.predict");
        assert_eq!(config.model.kind, ClassifierKind::Onnx);
        assert_eq!(config.history.path, PathBuf::from("prediction_history.json"));
        assert_eq!(config.rules.max_avg_order_value, 1000.0);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_load_from_path_applies_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[nats]
url = "nats://broker:4222"
request_subject = "predict"

[model]
kind = "baseline"

[pipeline]
workers = 2

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.nats.url, "nats://broker:4222");
        assert_eq!(config.nats.queue_group, None);
        assert_eq!(config.model.kind, ClassifierKind::Baseline);
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.rules, SuspicionThresholds::default());
        assert_eq!(config.history.path, PathBuf::from("prediction_history.json"));
        assert_eq!(config.pipeline.metrics_interval_secs, 60);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load_from_path("does/not/exist.toml").is_err());
    }
}
