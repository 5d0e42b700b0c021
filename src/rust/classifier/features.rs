use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

use super::utils::normalize_vector;

lazy_static! {
    /// Words of two or more word characters, as the training toolchain tokenizes them.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid");
}

/// Serialized settings of the TF-IDF vectorizer the model was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerSpec {
    /// Term (or space-joined n-gram) to feature column
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column; absent means raw term frequency
    #[serde(default)]
    pub idf: Option<Vec<f32>>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub strip_accents: bool,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    /// L2-normalize the final vector
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// Turns raw text into the feature vector the linear model scores.
#[derive(Debug)]
pub(crate) struct Vectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Array1<f32>>,
    lowercase: bool,
    strip_accents: bool,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    normalize: bool,
    stop_words: HashSet<String>,
    num_features: usize,
}

impl Vectorizer {
    /// Checks the spec for internal consistency. Errors describe what is wrong
    /// with the artifact.
    pub(crate) fn from_spec(spec: VectorizerSpec) -> Result<Self, String> {
        let num_features = spec.vocabulary.len();
        if num_features == 0 {
            return Err("vectorizer vocabulary is empty".into());
        }

        let mut seen = vec![false; num_features];
        for (term, &column) in &spec.vocabulary {
            if column >= num_features {
                return Err(format!(
                    "vocabulary term '{}' maps to column {} but there are only {} features",
                    term, column, num_features
                ));
            }
            if seen[column] {
                return Err(format!("vocabulary column {} is assigned twice", column));
            }
            seen[column] = true;
        }

        let (min_n, max_n) = spec.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }

        let idf = match spec.idf {
            Some(idf) => {
                if idf.len() != num_features {
                    return Err(format!(
                        "idf has {} weights but the vocabulary has {} terms",
                        idf.len(), num_features
                    ));
                }
                if idf.iter().any(|w| !w.is_finite()) {
                    return Err("idf contains non-finite weights".into());
                }
                Some(Array1::from(idf))
            }
            None => None,
        };

        Ok(Self {
            vocabulary: spec.vocabulary,
            idf,
            lowercase: spec.lowercase,
            strip_accents: spec.strip_accents,
            ngram_range: spec.ngram_range,
            sublinear_tf: spec.sublinear_tf,
            normalize: spec.normalize,
            stop_words: spec.stop_words.into_iter().collect(),
            num_features,
        })
    }

    pub(crate) fn num_features(&self) -> usize {
        self.num_features
    }

    fn preprocess(&self, text: &str) -> String {
        let text = if self.lowercase { text.to_lowercase() } else { text.to_string() };
        if self.strip_accents {
            strip_accents(&text)
        } else {
            text
        }
    }

    /// Splits text into the terms and n-grams the vocabulary is keyed by.
    pub(crate) fn analyze(&self, text: &str) -> Vec<String> {
        let text = self.preprocess(text);
        let words: Vec<&str> = TOKEN_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|w| !self.stop_words.contains(*w))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > words.len() {
                break;
            }
            for window in words.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    pub(crate) fn transform(&self, text: &str) -> Array1<f32> {
        let mut features = Array1::<f32>::zeros(self.num_features);
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                features[column] += 1.0;
            }
        }

        if self.sublinear_tf {
            features.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        if let Some(idf) = &self.idf {
            features *= idf;
        }
        if self.normalize {
            features = normalize_vector(&features);
        }
        features
    }
}

/// Unicode decomposition (NFKD) with combining marks removed: á → a, ñ → n, ﬁ → fi.
fn strip_accents(text: &str) -> String {
    text.nfkd()
        .filter(|&c| canonical_combining_class(c) == 0)
        .collect()
}
