//! Append-only prediction history.
//!
//! The history is a single pretty-printed JSON array. Every append reads the
//! whole collection, adds one entry and rewrites it. Appends inside the process
//! are serialized through one writer lock, and each rewrite goes to a sibling
//! temp file that is renamed over the collection, so readers only ever see a
//! complete array. Separate processes sharing one file are not coordinated.

use crate::types::prediction::{HistoryEntry, Prediction};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Durable record of completed predictions
pub struct HistoryStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp the prediction and append it to the collection.
    ///
    /// Creates the collection if it does not exist. Existing elements are
    /// carried over verbatim, whatever their shape; only a file that is not a
    /// JSON array is an error, and it is left untouched.
    pub fn append(&self, prediction: &Prediction) -> Result<HistoryEntry> {
        let _guard = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("History lock poisoned: {}", e))?;

        let entry = HistoryEntry::new(prediction.clone());

        let mut entries = if self.path.exists() {
            self.read_raw()?
        } else {
            Vec::new()
        };
        entries.push(serde_json::to_value(&entry).context("Failed to serialize history entry")?);

        self.write_atomic(&entries)?;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            label = %entry.prediction.label,
            "Prediction appended to history"
        );

        Ok(entry)
    }

    /// Load the collection as typed entries; an absent file reads as empty.
    ///
    /// Fails on elements this process did not write in its own format, such
    /// as entries with offset-less timestamps.
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        self.read_raw()?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value(value)
                    .with_context(|| format!("Malformed history entry at index {}", i))
            })
            .collect()
    }

    /// Load the collection as untyped JSON elements
    pub fn read_raw(&self) -> Result<Vec<Value>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open history {}", self.path.display()))?;

        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse history {}", self.path.display()))
    }

    fn write_atomic(&self, entries: &[Value]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create history directory {}", dir.display()))?;

        let tmp = NamedTempFile::new_in(&dir).context("Failed to create temporary history file")?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, entries)
                .context("Failed to serialize history")?;
            writer.flush().context("Failed to write history")?;
        }

        // Temp files start owner-only; keep whatever mode the collection had
        if let Ok(metadata) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .context("Failed to copy history permissions")?;
        }

        tmp.as_file()
            .sync_all()
            .context("Failed to sync history")?;

        // The temp file is removed on drop if the rename fails
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace history {}", self.path.display()))?;

        sync_dir(&dir)
    }
}

/// Make the rename itself durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .with_context(|| format!("Failed to sync history directory {}", dir.display()))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::customer::FeatureVector;
    use crate::types::prediction::Label;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn prediction(label: Label, age: u32) -> Prediction {
        Prediction {
            label,
            confidence: Some(81.25),
            input: FeatureVector {
                age,
                gender: "Male".to_string(),
                country: "USA".to_string(),
                avg_order_value: 80.0,
                total_orders: 12,
                days_since_last_purchase: 40,
                preferred_category: "Home".to_string(),
                email_open_rate: 0.4,
                loyalty_score: 55,
                churn_risk: 0.2,
            },
            triggered_rules: Vec::new(),
        }
    }

    #[test]
    fn test_first_append_creates_file() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("prediction_history.json"));
        assert!(!store.path().exists());

        store.append(&prediction(Label::Normal, 30)).unwrap();

        assert!(store.path().exists());
        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prediction.label, Label::Normal);
    }

    #[test]
    fn test_appends_preserve_order() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("prediction_history.json"));

        store.append(&prediction(Label::Normal, 1)).unwrap();
        store.append(&prediction(Label::Loyal, 2)).unwrap();
        store.append(&prediction(Label::Fraudulent, 3)).unwrap();

        let entries = store.read_all().unwrap();
        let ages: Vec<u32> = entries.iter().map(|e| e.prediction.input.age).collect();
        assert_eq!(ages, vec![1, 2, 3]);
        assert!(entries[0].timestamp <= entries[1].timestamp);
        assert!(entries[1].timestamp <= entries[2].timestamp);
    }

    #[test]
    fn test_file_is_indented_json_array() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("prediction_history.json"));
        store.append(&prediction(Label::Loyal, 30)).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {"));

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["label"], "Loyal");
        assert_eq!(first["confidence"], 81.25);
        assert_eq!(first["input"]["last_purchase"], 40);
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/logs/history.json"));

        store.append(&prediction(Label::Normal, 30)).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_history_is_left_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prediction_history.json");
        fs::write(&path, "[{\"label\": ").unwrap();

        let store = HistoryStore::new(&path);
        let err = store.append(&prediction(Label::Normal, 30)).unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to parse history"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"label\": ");
        // No stray temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(HistoryStore::new(dir.path().join("prediction_history.json")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.append(&prediction(Label::Normal, t * 100 + i)).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 80);

        // Each writer's own entries stay in call order
        for t in 0..8u32 {
            let ages: Vec<u32> = entries
                .iter()
                .map(|e| e.prediction.input.age)
                .filter(|age| age / 100 == t)
                .collect();
            let expected: Vec<u32> = (0..10).map(|i| t * 100 + i).collect();
            assert_eq!(ages, expected);
        }
    }

    #[test]
    fn test_append_keeps_entries_in_foreign_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prediction_history.json");
        let existing = r#"[
  {
    "label": "Loyal",
    "confidence": 93.0,
    "input": {"age": 34, "last_purchase": 12},
    "timestamp": "2025-07-10T12:34:56.123456"
  }
]"#;
        fs::write(&path, existing).unwrap();

        let store = HistoryStore::new(&path);
        store.append(&prediction(Label::Normal, 30)).unwrap();

        let raw = store.read_raw().unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["timestamp"], "2025-07-10T12:34:56.123456");
        assert_eq!(raw[0]["input"]["age"], 34);
        assert_eq!(raw[1]["label"], "Normal");
        assert_eq!(raw[1]["input"]["age"], 30);

        // A second append still works on the mixed collection
        store.append(&prediction(Label::Loyal, 31)).unwrap();
        assert_eq!(store.read_raw().unwrap().len(), 3);
    }

    #[test]
    fn test_non_array_history_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prediction_history.json");
        fs::write(&path, r#"{"label": "Normal"}"#).unwrap();

        let store = HistoryStore::new(&path);
        let err = store.append(&prediction(Label::Normal, 30)).unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to parse history"));
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"label": "Normal"}"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_append_preserves_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("prediction_history.json"));
        store.append(&prediction(Label::Normal, 1)).unwrap();

        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();
        store.append(&prediction(Label::Normal, 2)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_read_all_without_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("missing.json"));
        assert!(store.read_all().unwrap().is_empty());
    }
}
