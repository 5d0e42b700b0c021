/// Represents the different ways routing a complaint text to a department can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    /// The persisted model is missing, unreadable, corrupted or incompatible.
    /// Nothing can be classified until a valid artifact is supplied.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// An input text was rejected before it reached the model
    #[error("Invalid input at position {index}: {reason}")]
    InvalidInput { index: usize, reason: String },
    /// The model failed while scoring otherwise valid input
    #[error("Classification failed: {0}")]
    ClassificationFailure(String),
}

impl ClassifierError {
    pub(crate) fn invalid(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInput { index, reason: reason.into() }
    }

    /// Whether the caller can reasonably recover (re-prompt, retry once, leave
    /// unclassified). `ModelUnavailable` needs an operator.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ModelUnavailable(_))
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for ClassifierError {
    fn from(err: ort::Error) -> Self {
        ClassifierError::ModelUnavailable(err.to_string())
    }
}
