//! Classifier backends, override rule and inference engine

pub mod classifier;
pub mod encoding;
pub mod inference;
pub mod onnx;
pub mod rules;

pub use classifier::{BaselineClassifier, Classifier};
pub use encoding::FeatureEncoder;
pub use inference::InferenceEngine;
pub use onnx::OnnxClassifier;
pub use rules::SuspicionThresholds;
