use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{error, info};
use ndarray::{Array1, Array2};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::label::{DepartmentLabel, Vocabulary};
use super::model::DepartmentModel;
use super::utils::{average_vectors, first_argmax, normalize_vector};
use crate::runtime::{create_session_builder, RuntimeConfig};

fn default_max_sequence_length() -> usize {
    256
}

/// A department and the sample complaints its prototype is built from
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentDefinition {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub examples: Vec<String>,
}

/// Manifest of an embedding-based model. File paths are relative to the
/// manifest's directory unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingArtifact {
    #[serde(default)]
    pub model_version: Option<String>,
    pub model_file: PathBuf,
    pub tokenizer_file: PathBuf,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
    pub departments: Vec<DepartmentDefinition>,
}

/// Failure while turning one text into an embedding
#[derive(Debug)]
enum EmbedError {
    TooLong { tokens: usize, max: usize },
    Tokenizer(String),
    Model(String),
}

impl std::fmt::Display for EmbedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLong { tokens, max } => {
                write!(f, "input too long: {} tokens (max: {})", tokens, max)
            }
            Self::Tokenizer(msg) => write!(f, "tokenizer error: {}", msg),
            Self::Model(msg) => write!(f, "model error: {}", msg),
        }
    }
}

/// Tokenizer + ONNX session producing normalized sentence embeddings.
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask`, both `[batch_size, sequence_length]`
/// - Output `[batch_size, sequence_length, embedding_size]`
/// - Use the first token's embedding as the sequence embedding
#[derive(Debug)]
struct Encoder {
    tokenizer: Tokenizer,
    session: Session,
    max_sequence_length: usize,
}

impl Encoder {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;
        let token_ids = encoding.get_ids();
        if token_ids.len() > self.max_sequence_length {
            return Err(EmbedError::TooLong {
                tokens: token_ids.len(),
                max: self.max_sequence_length,
            });
        }
        Ok(token_ids.to_vec())
    }

    fn embed_text(&self, text: &str) -> Result<Array1<f32>, EmbedError> {
        let tokens = self.tokenize(text)?;
        self.get_embedding(&tokens)
    }

    fn get_embedding(&self, tokens: &[u32]) -> Result<Array1<f32>, EmbedError> {
        let ids: Vec<i64> = tokens.iter().map(|&x| x as i64).collect();
        let input_ids = Array2::from_shape_vec((1, tokens.len()), ids)
            .map_err(|e| EmbedError::Model(format!("Failed to create input array: {}", e)))?;
        let attention_mask = Array2::from_shape_vec(
            (1, tokens.len()),
            tokens.iter().map(|&x| if x == 0 { 0i64 } else { 1i64 }).collect(),
        )
        .map_err(|e| EmbedError::Model(format!("Failed to create mask array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(input_ids)
                .map_err(|e| EmbedError::Model(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(attention_mask)
                .map_err(|e| EmbedError::Model(format!("Failed to create mask tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| EmbedError::Model(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedError::Model(format!("Failed to extract output tensor: {}", e)))?;
        if output_tensor.ndim() != 3 {
            return Err(EmbedError::Model(format!(
                "expected a 3-dimensional output, got shape {:?}",
                output_tensor.shape()
            )));
        }

        let embedding_slice = output_tensor.slice(ndarray::s![0, 0, ..]);
        let embedding = Array1::from_iter(embedding_slice.iter().cloned());
        Ok(normalize_vector(&embedding))
    }
}

/// Nearest-prototype department model over ONNX sentence embeddings.
#[derive(Debug)]
pub struct EmbeddingModel {
    vocabulary: Vocabulary,
    encoder: Encoder,
    /// One normalized prototype per vocabulary label, same order
    prototypes: Vec<Array1<f32>>,
}

impl EmbeddingModel {
    pub fn load(
        artifact: EmbeddingArtifact,
        base_dir: &Path,
        runtime: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let unavailable = |msg: String| ClassifierError::ModelUnavailable(msg);

        let vocabulary = Vocabulary::new(
            artifact.model_version.clone(),
            artifact.departments.iter().map(|d| d.label.clone()),
        )
        .map_err(unavailable)?;

        let model_path = resolve(base_dir, &artifact.model_file);
        let tokenizer_path = resolve(base_dir, &artifact.tokenizer_file);
        if !model_path.exists() {
            return Err(unavailable(format!("ONNX model not found: {}", model_path.display())));
        }
        if !tokenizer_path.exists() {
            return Err(unavailable(format!("Tokenizer not found: {}", tokenizer_path.display())));
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            unavailable(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(runtime)?.commit_from_file(&model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        let encoder = Encoder {
            tokenizer,
            session,
            max_sequence_length: artifact.max_sequence_length,
        };

        let mut prototypes = Vec::with_capacity(artifact.departments.len());
        for department in &artifact.departments {
            if department.examples.is_empty() {
                return Err(unavailable(format!(
                    "department '{}' has no examples",
                    department.label
                )));
            }
            let mut embedded = Vec::with_capacity(department.examples.len());
            for (i, example) in department.examples.iter().enumerate() {
                let embedding = encoder.embed_text(example).map_err(|e| {
                    unavailable(format!(
                        "example {} of department '{}' cannot be embedded: {}",
                        i + 1,
                        department.label,
                        e
                    ))
                })?;
                embedded.push(embedding);
            }
            let size = embedded[0].len();
            prototypes.push(normalize_vector(&average_vectors(&embedded, size)));
        }

        Ok(Self {
            vocabulary,
            encoder,
            prototypes,
        })
    }

    /// The model must take `input_ids` and `attention_mask` and produce embeddings
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelUnavailable(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelUnavailable(
                "Model must have at least 1 output for embeddings".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

impl DepartmentModel for EmbeddingModel {
    fn kind(&self) -> &'static str {
        "embedding"
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn predict(&self, texts: &[&str]) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let input = self.encoder.embed_text(text).map_err(|e| match e {
                    EmbedError::TooLong { .. } => ClassifierError::invalid(index, e.to_string()),
                    _ => ClassifierError::ClassificationFailure(e.to_string()),
                })?;
                // Both sides are unit length, so the dot product is the cosine similarity
                let scores: Vec<f32> = self.prototypes.iter().map(|p| input.dot(p)).collect();
                first_argmax(&scores)
                    .and_then(|i| self.vocabulary.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        ClassifierError::ClassificationFailure(format!(
                            "unusable similarity scores {:?}",
                            scores
                        ))
                    })
            })
            .collect()
    }
}
