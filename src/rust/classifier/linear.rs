use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::features::{Vectorizer, VectorizerSpec};
use super::label::{DepartmentLabel, Vocabulary};
use super::model::DepartmentModel;
use super::utils::first_argmax;

/// On-disk form of a TF-IDF + one-vs-rest linear SVM department model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    #[serde(default)]
    pub model_version: Option<String>,
    /// Department labels in the model's class order
    pub labels: Vec<String>,
    pub vectorizer: VectorizerSpec,
    /// One weight row per label, or a single row for a two-label model
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

/// A linear department model held in memory, read-only after load.
#[derive(Debug)]
pub struct LinearModel {
    vocabulary: Vocabulary,
    vectorizer: Vectorizer,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearModel {
    /// Validates the artifact and builds the model. Every inconsistency is
    /// reported as `ModelUnavailable`, since the artifact cannot be used.
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, ClassifierError> {
        let incompatible = |msg: String| {
            ClassifierError::ModelUnavailable(format!("incompatible linear model: {}", msg))
        };

        let vocabulary =
            Vocabulary::new(artifact.model_version, artifact.labels).map_err(incompatible)?;
        let vectorizer = Vectorizer::from_spec(artifact.vectorizer).map_err(incompatible)?;

        let rows = artifact.coef.len();
        let binary = vocabulary.len() == 2 && rows == 1;
        if rows != vocabulary.len() && !binary {
            return Err(incompatible(format!(
                "{} coefficient rows for {} labels",
                rows,
                vocabulary.len()
            )));
        }
        if artifact.intercept.len() != rows {
            return Err(incompatible(format!(
                "{} intercepts for {} coefficient rows",
                artifact.intercept.len(),
                rows
            )));
        }

        let num_features = vectorizer.num_features();
        let mut flat = Vec::with_capacity(rows * num_features);
        for (i, row) in artifact.coef.into_iter().enumerate() {
            if row.len() != num_features {
                return Err(incompatible(format!(
                    "coefficient row {} has {} weights, expected {}",
                    i,
                    row.len(),
                    num_features
                )));
            }
            flat.extend(row);
        }
        if flat.iter().chain(artifact.intercept.iter()).any(|w| !w.is_finite()) {
            return Err(incompatible("weights contain non-finite values".into()));
        }

        let coef = Array2::from_shape_vec((rows, num_features), flat)
            .map_err(|e| incompatible(e.to_string()))?;

        Ok(Self {
            vocabulary,
            vectorizer,
            coef,
            intercept: Array1::from(artifact.intercept),
        })
    }

    /// Raw decision values, one per coefficient row
    pub fn decision_function(&self, text: &str) -> Array1<f32> {
        let features = self.vectorizer.transform(text);
        self.coef.dot(&features) + &self.intercept
    }

    fn decide(&self, scores: &Array1<f32>) -> Result<&DepartmentLabel, ClassifierError> {
        let index = if self.coef.nrows() == 1 {
            let score = scores[0];
            if !score.is_finite() {
                None
            } else if score > 0.0 {
                Some(1)
            } else {
                Some(0)
            }
        } else {
            scores.as_slice().and_then(first_argmax)
        };

        index
            .and_then(|i| self.vocabulary.get(i))
            .ok_or_else(|| ClassifierError::ClassificationFailure(format!(
                "model produced unusable scores {:?}",
                scores.to_vec()
            )))
    }
}

impl DepartmentModel for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn predict(&self, texts: &[&str]) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        texts
            .iter()
            .map(|text| {
                let scores = self.decision_function(text);
                self.decide(&scores).cloned()
            })
            .collect()
    }
}
