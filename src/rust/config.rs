use std::env;
use std::path::{Path, PathBuf};

use crate::model_store::{ModelStore, ARTIFACT_FILE, DEFAULT_ARTIFACT};
#[cfg(feature = "onnx")]
use crate::runtime::RuntimeConfig;

/// Overrides the artifact location
pub const MODEL_PATH_ENV: &str = "COMPLAINT_ROUTER_MODEL";
/// Expected SHA-256 of the artifact, hex encoded
pub const MODEL_SHA256_ENV: &str = "COMPLAINT_ROUTER_MODEL_SHA256";

/// Longest complaint text accepted for classification, in characters
pub const DEFAULT_MAX_TEXT_CHARS: usize = 4096;

/// Where the department model lives and how inputs are bounded.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub artifact_path: PathBuf,
    pub expected_sha256: Option<String>,
    pub max_text_chars: usize,
    #[cfg(feature = "onnx")]
    pub runtime: RuntimeConfig,
}

impl ClassifierConfig {
    pub fn new(artifact_path: impl AsRef<Path>) -> Self {
        Self {
            artifact_path: artifact_path.as_ref().to_path_buf(),
            expected_sha256: None,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            #[cfg(feature = "onnx")]
            runtime: RuntimeConfig::default(),
        }
    }

    /// Resolves the artifact the way the binary does without flags:
    /// 1. `COMPLAINT_ROUTER_MODEL`
    /// 2. the default artifact in the model store
    pub fn from_env() -> Self {
        let path = match env::var(MODEL_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => ModelStore::get_default_models_dir()
                .join(DEFAULT_ARTIFACT)
                .join(ARTIFACT_FILE),
        };
        let mut config = Self::new(path);
        if let Ok(hash) = env::var(MODEL_SHA256_ENV) {
            if !hash.trim().is_empty() {
                config.expected_sha256 = Some(hash.trim().to_string());
            }
        }
        config
    }

    pub fn with_expected_sha256(mut self, hash: impl Into<String>) -> Self {
        self.expected_sha256 = Some(hash.into());
        self
    }

    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.max_text_chars = max;
        self
    }

    #[cfg(feature = "onnx")]
    pub fn with_runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = ClassifierConfig::new("/srv/models/depto.json")
            .with_expected_sha256("abc")
            .with_max_text_chars(10);
        assert_eq!(config.artifact_path, PathBuf::from("/srv/models/depto.json"));
        assert_eq!(config.expected_sha256.as_deref(), Some("abc"));
        assert_eq!(config.max_text_chars, 10);
    }
}
