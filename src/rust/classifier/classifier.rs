use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, error, info, warn};

use super::artifact::parse_artifact;
use super::error::ClassifierError;
use super::label::{DepartmentLabel, Vocabulary};
use super::model::DepartmentModel;
use super::ClassifierInfo;
use crate::config::{ClassifierConfig, DEFAULT_MAX_TEXT_CHARS};
use crate::model_store::sha256_hex;

/// Routes complaint texts to departments with a model loaded once.
///
/// # Thread Safety
///
/// The model is read-only after [`DepartmentClassifier::load`] and every
/// operation takes `&self`, so a single instance can be shared between
/// request handlers behind an `Arc` without locking.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use complaint_router::{ClassifierConfig, DepartmentClassifier};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(DepartmentClassifier::load(
///     &ClassifierConfig::new("data/department_classifier.json"),
/// )?);
///
/// let worker = Arc::clone(&classifier);
/// thread::spawn(move || {
///     worker.classify(&["La basura no pasa hace una semana"]).unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DepartmentClassifier {
    artifact_path: Option<PathBuf>,
    model: Box<dyn DepartmentModel>,
    max_text_chars: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<DepartmentClassifier>();
    }
};

impl DepartmentClassifier {
    /// Reads, verifies and parses the persisted artifact and builds the model.
    ///
    /// # Errors
    /// `ModelUnavailable` when the artifact is missing, unreadable, fails the
    /// configured SHA-256 check, or does not describe a usable model.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let start = Instant::now();
        let path = &config.artifact_path;
        info!("Loading department model from {:?}", path);

        let bytes = fs::read(path).map_err(|e| {
            let reason = match e.kind() {
                io::ErrorKind::NotFound => format!("artifact not found at {}", path.display()),
                _ => format!("cannot read artifact {}: {}", path.display(), e),
            };
            error!("{}", reason);
            ClassifierError::ModelUnavailable(reason)
        })?;

        if let Some(expected) = &config.expected_sha256 {
            let actual = sha256_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                error!("Artifact hash mismatch: expected {}, got {}", expected, actual);
                return Err(ClassifierError::ModelUnavailable(format!(
                    "artifact hash mismatch: expected {}, got {}",
                    expected, actual
                )));
            }
            debug!("Artifact hash verified: {}", actual);
        }

        let artifact = parse_artifact(&bytes).map_err(|e| {
            error!("Rejected artifact {:?}: {}", path, e);
            e
        })?;
        let kind = artifact.kind();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let model = artifact.into_model(base_dir, config)?;

        info!(
            "Loaded {} department model (version {}, {} departments) in {:.2?}",
            kind,
            model.vocabulary().version().unwrap_or("unversioned"),
            model.vocabulary().len(),
            start.elapsed()
        );

        Ok(Self {
            artifact_path: Some(path.clone()),
            model,
            max_text_chars: config.max_text_chars,
        })
    }

    /// Wraps an already constructed model, e.g. one provided by the host
    /// application or a test double.
    pub fn from_model(model: Box<dyn DepartmentModel>) -> Self {
        Self {
            artifact_path: None,
            model,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.max_text_chars = max;
        self
    }

    /// The closed label set of the loaded model
    pub fn vocabulary(&self) -> &Vocabulary {
        self.model.vocabulary()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        let vocabulary = self.model.vocabulary();
        ClassifierInfo {
            artifact_path: self
                .artifact_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            model_kind: self.model.kind().to_string(),
            model_version: vocabulary.version().map(str::to_string),
            num_departments: vocabulary.len(),
            department_labels: vocabulary.iter().map(|l| l.as_str().to_string()).collect(),
            max_text_chars: self.max_text_chars,
        }
    }

    /// Checks a single text the way [`classify`](Self::classify) would,
    /// without touching the model.
    pub fn check_text(&self, text: &str) -> Result<(), ClassifierError> {
        self.validate(0, text).map(|_| ())
    }

    fn validate<'a>(&self, index: usize, text: &'a str) -> Result<&'a str, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::invalid(index, "text cannot be empty"));
        }
        if text.contains('\0') {
            return Err(ClassifierError::invalid(index, "text contains a NUL character"));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(ClassifierError::invalid(
                index,
                format!("text too long: {} characters (max: {})", chars, self.max_text_chars),
            ));
        }
        Ok(text)
    }

    /// Assigns a department to every text, in order.
    ///
    /// All texts are validated before any reaches the model, so a single bad
    /// entry fails the whole batch with `InvalidInput` naming its position.
    /// An empty batch yields an empty result.
    ///
    /// # Example
    /// ```no_run
    /// # use complaint_router::{ClassifierConfig, DepartmentClassifier};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let classifier = DepartmentClassifier::load(&ClassifierConfig::from_env())?;
    /// let labels = classifier.classify(&["El semáforo de la esquina no funciona"])?;
    /// println!("Routed to {}", labels[0]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn classify<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        let inputs = texts
            .iter()
            .enumerate()
            .map(|(i, text)| self.validate(i, text.as_ref()))
            .collect::<Result<Vec<&str>, _>>()?;
        self.run_model(&inputs)
    }

    /// Like [`classify`](Self::classify), for texts coming from loosely typed
    /// sources (form fields, JSON) where an entry may be missing.
    pub fn classify_entries<S: AsRef<str>>(
        &self,
        texts: &[Option<S>],
    ) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        let inputs = texts
            .iter()
            .enumerate()
            .map(|(i, text)| match text {
                Some(text) => self.validate(i, text.as_ref()),
                None => Err(ClassifierError::invalid(i, "text is missing")),
            })
            .collect::<Result<Vec<&str>, _>>()?;
        self.run_model(&inputs)
    }

    /// Single-text convenience used by the submission flow
    pub fn classify_one(&self, text: &str) -> Result<DepartmentLabel, ClassifierError> {
        self.classify(&[text])?
            .pop()
            .ok_or_else(|| ClassifierError::ClassificationFailure("model returned no label".into()))
    }

    fn run_model(&self, inputs: &[&str]) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.model.predict(inputs)));
        let labels = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Department model panicked: {}", reason);
                return Err(ClassifierError::ClassificationFailure(format!(
                    "model panicked: {}",
                    reason
                )));
            }
        };

        if labels.len() != inputs.len() {
            return Err(ClassifierError::ClassificationFailure(format!(
                "model returned {} labels for {} texts",
                labels.len(),
                inputs.len()
            )));
        }
        let vocabulary = self.model.vocabulary();
        if let Some(unknown) = labels.iter().find(|label| !vocabulary.contains(label)) {
            warn!("Model produced label '{}' outside its vocabulary", unknown);
            return Err(ClassifierError::ClassificationFailure(format!(
                "label '{}' is not a known department",
                unknown
            )));
        }

        debug!("Classified {} texts in {:.2?}", inputs.len(), start.elapsed());
        Ok(labels)
    }

    /// Releases the model. Classification after shutdown needs a new load.
    pub fn shutdown(self) {
        info!(
            "Releasing {} department model{}",
            self.model.kind(),
            self.artifact_path
                .as_ref()
                .map(|p| format!(" loaded from {:?}", p))
                .unwrap_or_default()
        );
        drop(self);
    }
}
