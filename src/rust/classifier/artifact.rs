use std::path::Path;

use serde::Deserialize;

use super::error::ClassifierError;
use super::linear::{LinearArtifact, LinearModel};
use super::model::DepartmentModel;
use crate::config::ClassifierConfig;

#[cfg(feature = "onnx")]
use super::embedding::{EmbeddingArtifact, EmbeddingModel};

/// Artifact layout version this build understands
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct Header {
    format_version: Option<u32>,
    kind: Option<String>,
}

/// A parsed model artifact, not yet turned into a usable model.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Linear(LinearArtifact),
    #[cfg(feature = "onnx")]
    Embedding(EmbeddingArtifact),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Linear(_) => "linear",
            #[cfg(feature = "onnx")]
            Artifact::Embedding(_) => "embedding",
        }
    }

    /// Builds the in-memory model. `base_dir` resolves files an artifact
    /// refers to by relative path.
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn into_model(
        self,
        base_dir: &Path,
        config: &ClassifierConfig,
    ) -> Result<Box<dyn DepartmentModel>, ClassifierError> {
        match self {
            Artifact::Linear(artifact) => Ok(Box::new(LinearModel::from_artifact(artifact)?)),
            #[cfg(feature = "onnx")]
            Artifact::Embedding(artifact) => Ok(Box::new(EmbeddingModel::load(
                artifact,
                base_dir,
                &config.runtime,
            )?)),
        }
    }
}

/// Parses artifact bytes, checking the header before the body so that
/// unsupported versions and kinds get a precise message.
pub fn parse_artifact(bytes: &[u8]) -> Result<Artifact, ClassifierError> {
    let header: Header = serde_json::from_slice(bytes).map_err(|e| {
        ClassifierError::ModelUnavailable(format!("artifact is corrupted: {}", e))
    })?;

    match header.format_version {
        Some(FORMAT_VERSION) => {}
        Some(other) => {
            return Err(ClassifierError::ModelUnavailable(format!(
                "unsupported artifact format version {} (expected {})",
                other, FORMAT_VERSION
            )))
        }
        None => {
            return Err(ClassifierError::ModelUnavailable(
                "artifact has no format_version".into(),
            ))
        }
    }

    match header.kind.as_deref() {
        Some("linear") => {}
        #[cfg(feature = "onnx")]
        Some("embedding") => {}
        #[cfg(not(feature = "onnx"))]
        Some("embedding") => {
            return Err(ClassifierError::ModelUnavailable(
                "embedding models require the `onnx` feature".into(),
            ))
        }
        Some(other) => {
            return Err(ClassifierError::ModelUnavailable(format!(
                "unknown model kind '{}'",
                other
            )))
        }
        None => {
            return Err(ClassifierError::ModelUnavailable(
                "artifact does not declare a model kind".into(),
            ))
        }
    }

    serde_json::from_slice(bytes).map_err(|e| {
        ClassifierError::ModelUnavailable(format!("artifact is incompatible: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage() {
        let err = parse_artifact(b"\x80\x03cclasificador\n").unwrap_err();
        assert!(matches!(err, ClassifierError::ModelUnavailable(_)));
    }

    #[test]
    fn test_rejects_future_format_version() {
        let err = parse_artifact(br#"{"format_version": 9, "kind": "linear"}"#).unwrap_err();
        assert!(err.to_string().contains("format version 9"));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = parse_artifact(br#"{"format_version": 1, "kind": "forest"}"#).unwrap_err();
        assert!(err.to_string().contains("forest"));
    }

    #[test]
    fn test_rejects_missing_body_fields() {
        let err = parse_artifact(br#"{"format_version": 1, "kind": "linear", "labels": ["A"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("incompatible"));
    }
}
