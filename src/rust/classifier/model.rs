use std::fmt::Debug;

use super::error::ClassifierError;
use super::label::{DepartmentLabel, Vocabulary};

/// A trained model that maps complaint texts to department labels.
///
/// Implementations must be pure with respect to `&self`: the same input
/// yields the same labels for the lifetime of the loaded model, and
/// concurrent calls never observe each other.
///
/// Inputs reaching `predict` are already validated (non-empty, within the
/// length limit). The returned vector must have one label per input, in
/// input order, each drawn from [`DepartmentModel::vocabulary`].
pub trait DepartmentModel: Send + Sync + Debug {
    /// Short name of the backend, used in logs and [`super::ClassifierInfo`]
    fn kind(&self) -> &'static str;

    /// The closed set of labels this model can produce
    fn vocabulary(&self) -> &Vocabulary;

    /// Scores every text and returns the winning department for each
    fn predict(&self, texts: &[&str]) -> Result<Vec<DepartmentLabel>, ClassifierError>;
}
