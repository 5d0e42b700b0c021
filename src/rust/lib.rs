//! Routes free-text complaints to the department responsible for them using
//! a pre-trained text classifier.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use complaint_router::{ClassifierConfig, DepartmentClassifier};
//!
//! let config = ClassifierConfig::new("data/department_classifier.json");
//! let classifier = DepartmentClassifier::load(&config)?;
//!
//! let labels = classifier.classify(&[
//!     "El semáforo de la esquina no funciona",
//!     "Hace dos semanas que no pasa el camión de la basura",
//! ])?;
//! for label in labels {
//!     println!("Department: {}", label);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The model is loaded once and never mutated, so the classifier can be
//! shared across threads using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use complaint_router::{ClassifierConfig, DepartmentClassifier};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let classifier = Arc::new(DepartmentClassifier::load(&ClassifierConfig::from_env())?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || {
//!         classifier.classify(&["Luminaria apagada en la plaza"]).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Submission flow
//!
//! [`ComplaintRegistry`] records complaints, rejects duplicates and assigns a
//! department to each new complaint exactly once.

pub mod classifier;
pub mod complaints;
pub mod config;
pub mod model_store;
#[cfg(feature = "onnx")]
mod runtime;

pub use classifier::{
    ClassifierError, ClassifierInfo, DepartmentClassifier, DepartmentLabel, DepartmentModel,
    LazyClassifier, Vocabulary,
};
pub use complaints::{
    Caller, Complaint, ComplaintError, ComplaintId, ComplaintRegistry, ComplaintStatus, Role,
    RoutingPolicy, UserId,
};
pub use config::ClassifierConfig;
pub use model_store::{ModelStore, StoreError};
#[cfg(feature = "onnx")]
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
