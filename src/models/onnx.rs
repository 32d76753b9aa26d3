//! ONNX Runtime implementation of the black-box classifier

use crate::models::classifier::Classifier;
use crate::models::encoding::FeatureEncoder;
use crate::types::customer::FeatureVector;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX export of the trained pipeline.
///
/// Expects a single float input of shape `[1, N]` where `N` is the encoder's
/// feature count, an int64 label output, and optionally a probability output
/// (plain tensor or `seq(map(int64, float))`).
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    encoder: FeatureEncoder,
    input_name: String,
    label_output: Option<String>,
    proba_output: Option<String>,
}

impl OnnxClassifier {
    /// Load the model artifact from file
    pub fn load<P: AsRef<Path>>(
        path: P,
        encoder: FeatureEncoder,
        onnx_threads: usize,
    ) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let proba_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        if label_output.is_none() && proba_output.is_none() {
            anyhow::bail!(
                "Model {} has neither a label nor a probability output",
                path.display()
            );
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            proba_output = ?proba_output,
            features = encoder.feature_count(),
            "Model loaded successfully"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            encoder,
            input_name,
            label_output,
            proba_output,
        })
    }

    /// Whether the artifact exposes class probabilities
    pub fn has_probabilities(&self) -> bool {
        self.proba_output.is_some()
    }

    /// Run the session once, returning the category code and probabilities
    fn run(&self, features: &FeatureVector) -> Result<(i64, Option<Vec<f64>>)> {
        let row = self.encoder.encode(features);

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .context("Classifier invocation failed")?;

        let probabilities = match &self.proba_output {
            Some(name) => Some(self.extract_probabilities(&outputs, name)?),
            None => None,
        };

        let code = match (&self.label_output, &probabilities) {
            (Some(name), _) => self.extract_label(&outputs, name)?,
            (None, Some(probs)) => argmax(probs)
                .ok_or_else(|| anyhow::anyhow!("Empty probability output"))?,
            (None, None) => anyhow::bail!("Model produced no label"),
        };

        debug!(model = %self.name, code = code, probabilities = ?probabilities, "ONNX inference complete");

        Ok((code, probabilities))
    }

    fn extract_label(&self, outputs: &SessionOutputs, output_name: &str) -> Result<i64> {
        let output = outputs
            .get(output_name)
            .ok_or_else(|| anyhow::anyhow!("Missing output {}", output_name))?;

        let (_, data) = output
            .try_extract_tensor::<i64>()
            .context("Label output is not an int64 tensor")?;

        data.first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Empty label output"))
    }

    /// Handles both tensor outputs and seq(map) outputs (zipmap exports)
    fn extract_probabilities(
        &self,
        outputs: &SessionOutputs,
        output_name: &str,
    ) -> Result<Vec<f64>> {
        let output = outputs
            .get(output_name)
            .ok_or_else(|| anyhow::anyhow!("Missing output {}", output_name))?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            // Batch size is 1, so the data is exactly one row
            return Ok(data.iter().map(|&p| p as f64).collect());
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return extract_from_sequence_map(output);
        }

        anyhow::bail!("Unsupported probability output format: {:?}", dtype)
    }
}

/// Extract class probabilities from seq(map(int64, float)), ordered by class id
fn extract_from_sequence_map(output: &DynValue) -> Result<Vec<f64>> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

    let mut kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
    kv_pairs.sort_by_key(|(class_id, _)| *class_id);

    Ok(kv_pairs.into_iter().map(|(_, p)| p as f64).collect())
}

fn argmax(values: &[f64]) -> Option<i64> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i as i64)
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        self.run(features).map(|(code, _)| code)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<Vec<f64>>> {
        if !self.has_probabilities() {
            return Ok(None);
        }
        self.run(features).map(|(_, probabilities)| probabilities)
    }

    fn predict_with_proba(&self, features: &FeatureVector) -> Result<(i64, Option<Vec<f64>>)> {
        self.run(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.9]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
