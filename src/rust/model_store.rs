use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::classifier::{parse_artifact, ClassifierError};

/// Name of the artifact the binary and [`crate::ClassifierConfig::from_env`] use
pub const DEFAULT_ARTIFACT: &str = "department_classifier";
/// File name of an installed artifact inside its directory
pub const ARTIFACT_FILE: &str = "model.json";
/// Overrides the store root; models live in `$COMPLAINT_ROUTER_HOME/models`
pub const HOME_ENV: &str = "COMPLAINT_ROUTER_HOME";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Artifact not installed: {0}")]
    NotInstalled(String),
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Artifact verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(#[from] ClassifierError),
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Local directory of installed department model artifacts.
#[derive(Clone, Debug)]
pub struct ModelStore {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(HOME_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path).join("models");
            }
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("complaint-router").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("complaint-router").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("complaint-router").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(ARTIFACT_FILE)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        let path = self.artifact_path(name);
        log::debug!("Artifact path: {:?} (exists: {})", path, path.exists());
        path.exists()
    }

    /// Checks the installed artifact against `expected_hash`
    pub fn verify(&self, name: &str, expected_hash: &str) -> Result<bool, StoreError> {
        let path = self.artifact_path(name);
        if !path.exists() {
            log::info!("Artifact {:?} does not exist", path);
            return Ok(false);
        }
        let bytes = fs::read(&path)?;
        let hash = sha256_hex(&bytes);
        log::info!("Calculated hash: {}", hash);
        log::info!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash.trim()))
    }

    /// Copies a local artifact into the store after checking it parses and,
    /// when given, matches `expected_hash`. Returns the installed path.
    pub fn install_from_file(
        &self,
        name: &str,
        source: &Path,
        expected_hash: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        log::info!("Installing artifact '{}' from {:?}", name, source);
        let bytes = fs::read(source)?;
        self.install_bytes(name, &bytes, expected_hash)
    }

    /// Fetches an artifact over HTTP(S) and installs it.
    /// Concurrent downloads through clones of this store are serialized.
    pub async fn download(
        &self,
        name: &str,
        url: &str,
        expected_hash: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        let _lock = self.download_lock.lock().await;
        log::info!("Downloading artifact '{}' from {}", name, url);
        let response = reqwest::get(url).await?.error_for_status()?;
        log::info!("Download response status: {}", response.status());
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());
        self.install_bytes(name, &bytes, expected_hash)
    }

    fn install_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        expected_hash: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        let hash = sha256_hex(bytes);
        if let Some(expected) = expected_hash {
            if !hash.eq_ignore_ascii_case(expected.trim()) {
                log::error!("Artifact hash mismatch: expected {}, got {}", expected, hash);
                return Err(StoreError::HashMismatch {
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        let artifact = parse_artifact(bytes)?;
        log::info!("Artifact '{}' is a {} model", name, artifact.kind());

        let path = self.artifact_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("json.partial");
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &path)?;

        // Verify after writing
        if sha256_hex(&fs::read(&path)?) != hash {
            let _ = fs::remove_file(&path);
            return Err(StoreError::VerificationFailed);
        }

        log::info!("Artifact '{}' installed at {:?} (sha256 {})", name, path, hash);
        Ok(path)
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Err(StoreError::NotInstalled(name.to_string()));
        }
        fs::remove_file(&path)?;
        log::info!("Removed artifact '{}'", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_artifact_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models")).unwrap();
        assert_eq!(
            store.artifact_path("transito_v2"),
            dir.path().join("models").join("transito_v2").join("model.json")
        );
        assert!(!store.is_installed("transito_v2"));
        assert!(matches!(store.remove("transito_v2"), Err(StoreError::NotInstalled(_))));
    }
}
