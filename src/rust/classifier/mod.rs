mod artifact;
#[allow(clippy::module_inception)]
mod classifier;
#[cfg(feature = "onnx")]
mod embedding;
mod error;
mod features;
mod label;
mod lazy;
mod linear;
mod model;
mod utils;

pub use artifact::{parse_artifact, Artifact, FORMAT_VERSION};
pub use classifier::DepartmentClassifier;
#[cfg(feature = "onnx")]
pub use embedding::{DepartmentDefinition, EmbeddingArtifact, EmbeddingModel};
pub use error::ClassifierError;
pub use features::VectorizerSpec;
pub use label::{DepartmentLabel, Vocabulary};
pub use lazy::LazyClassifier;
pub use linear::{LinearArtifact, LinearModel};
pub use model::DepartmentModel;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassifierInfo {
    /// Path of the artifact the model was loaded from, if any
    pub artifact_path: Option<String>,
    /// Backend name, e.g. `linear`
    pub model_kind: String,
    pub model_version: Option<String>,
    pub num_departments: usize,
    /// Department labels in model order
    pub department_labels: Vec<String>,
    pub max_text_chars: usize,
}
