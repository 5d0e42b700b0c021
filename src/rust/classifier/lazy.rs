use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use super::classifier::DepartmentClassifier;
use super::error::ClassifierError;
use super::label::DepartmentLabel;
use crate::config::ClassifierConfig;

/// Loads the department model on first use and keeps it for the rest of
/// the process.
///
/// A failed load is not cached: every call retries until an artifact loads,
/// after which the same model serves all callers and is never reloaded.
/// After [`shutdown`](Self::shutdown) every call fails with `ModelUnavailable`.
#[derive(Debug)]
pub struct LazyClassifier {
    config: ClassifierConfig,
    slot: Mutex<Slot>,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Loaded(Arc<DepartmentClassifier>),
    ShutDown,
}

impl LazyClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(Slot::Empty),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), Slot::Loaded(_))
    }

    /// Returns the loaded classifier, loading it if this is the first
    /// successful call. Concurrent first callers wait for a single load.
    pub fn get(&self) -> Result<Arc<DepartmentClassifier>, ClassifierError> {
        let mut slot = self.lock();
        match &*slot {
            Slot::Loaded(classifier) => return Ok(Arc::clone(classifier)),
            Slot::ShutDown => {
                return Err(ClassifierError::ModelUnavailable(
                    "classifier has been shut down".into(),
                ))
            }
            Slot::Empty => {}
        }

        match DepartmentClassifier::load(&self.config) {
            Ok(classifier) => {
                let classifier = Arc::new(classifier);
                *slot = Slot::Loaded(Arc::clone(&classifier));
                info!("Department model cached for the process lifetime");
                Ok(classifier)
            }
            Err(e) => {
                warn!("Department model not loaded, will retry on next use: {}", e);
                Err(e)
            }
        }
    }

    pub fn classify<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<DepartmentLabel>, ClassifierError> {
        self.get()?.classify(texts)
    }

    /// Drops the cached model for good; the artifact is not loaded again in
    /// this process. Outstanding `Arc` handles keep the model alive until they
    /// are released.
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.lock(), Slot::ShutDown);
        if let Slot::Loaded(classifier) = previous {
            match Arc::try_unwrap(classifier) {
                Ok(classifier) => classifier.shutdown(),
                Err(_) => {
                    info!("Department model released; still referenced by in-flight callers")
                }
            }
        }
    }
}
