//! File-system model store.
//!
//! Layout of the model directory:
//! - `model.json`: the serialized `ModelArtifact`
//! - `manifest.json`: `{ version, created_at, files: { "model.json": sha256 } }`
//!
//! Both files are written to a `.tmp` sibling and renamed into place, model
//! first and manifest last. Loading verifies the manifest hash against the
//! exact bytes that are parsed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::ml::{ModelArtifact, ARTIFACT_FORMAT_VERSION};
use crate::config::parse_bool_env;
use crate::domain::{feature_names, FEATURE_COUNT};
use crate::ports::{Classifier, ModelStore};

pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Refuse artifacts without a manifest when set.
pub const REQUIRE_MANIFEST_ENV: &str = "CARDIOLENS_REQUIRE_MANIFEST";

const MANIFEST_VERSION: u32 = 1;

/// Errors that can occur while saving or loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("Artifact IO failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest.json missing and {REQUIRE_MANIFEST_ENV} is set")]
    ManifestRequired,

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("Invalid artifact: {0}")]
    Invalid(String),

    #[error("Artifact serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactManifest {
    version: u32,
    created_at: DateTime<Utc>,
    files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Model store backed by a directory.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
    require_manifest: bool,
}

impl FileModelStore {
    /// Store rooted at `dir`; manifest enforcement follows
    /// `CARDIOLENS_REQUIRE_MANIFEST`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            require_manifest: parse_bool_env(REQUIRE_MANIFEST_ENV),
        }
    }

    #[must_use]
    pub fn with_manifest_required(mut self, required: bool) -> Self {
        self.require_manifest = required;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn verify_manifest(&self, model_bytes: &[u8]) -> Result<(), ArtifactError> {
        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            if self.require_manifest {
                return Err(ArtifactError::ManifestRequired);
            }
            tracing::warn!(
                "No manifest in {:?}; loading model without integrity check",
                self.dir
            );
            return Ok(());
        }

        let content = fs::read(&manifest_path).map_err(io_error(&manifest_path))?;
        let manifest: ArtifactManifest = serde_json::from_slice(&content)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }

        let expected = manifest.files.get(MODEL_FILE).ok_or_else(|| {
            ArtifactError::Invalid(format!("manifest.json must include {MODEL_FILE}"))
        })?;
        if !constant_time_eq_str(&sha256_hex(model_bytes), expected) {
            return Err(ArtifactError::HashMismatch(MODEL_FILE.into()));
        }

        for (rel, expected_hex) in manifest.files.iter().filter(|(rel, _)| *rel != MODEL_FILE) {
            let path = self.dir.join(rel);
            let bytes = fs::read(&path).map_err(|e| {
                ArtifactError::Invalid(format!(
                    "Manifest references missing/unreadable file {path:?}: {e}"
                ))
            })?;
            if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
                return Err(ArtifactError::HashMismatch(rel.clone()));
            }
        }

        tracing::debug!("Manifest verified (created_at={})", manifest.created_at);
        Ok(())
    }
}

fn validate(artifact: &ModelArtifact) -> Result<(), ArtifactError> {
    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ArtifactError::Invalid(format!(
            "Unsupported artifact format version: {}",
            artifact.format_version
        )));
    }
    if artifact.feature_names != feature_names() {
        return Err(ArtifactError::Invalid(format!(
            "Feature order {:?} does not match the expected 13 clinical features",
            artifact.feature_names
        )));
    }
    let n = artifact.pipeline.n_features();
    if n != FEATURE_COUNT {
        return Err(ArtifactError::Invalid(format!(
            "Model expects {n} features, need {FEATURE_COUNT}"
        )));
    }
    if artifact.family != artifact.pipeline.family() {
        return Err(ArtifactError::Invalid(format!(
            "Declared family {} does not match fitted {}",
            artifact.family,
            artifact.pipeline.family()
        )));
    }
    artifact
        .pipeline
        .model()
        .check_structure()
        .map_err(|e| ArtifactError::Invalid(format!("Malformed model: {e}")))?;
    Ok(())
}

impl ModelStore for FileModelStore {
    type Error = ArtifactError;

    fn save(&self, artifact: &ModelArtifact) -> Result<(), ArtifactError> {
        validate(artifact)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let model_bytes = serde_json::to_vec_pretty(artifact)?;
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            created_at: Utc::now(),
            files: BTreeMap::from([(MODEL_FILE.to_string(), sha256_hex(&model_bytes))]),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        write_atomic(&self.model_path(), &model_bytes)?;
        write_atomic(&self.manifest_path(), &manifest_bytes)?;

        tracing::info!(
            "Saved {} artifact to {:?} ({} bytes)",
            artifact.model_name,
            self.dir,
            model_bytes.len()
        );
        Ok(())
    }

    fn load(&self) -> Result<ModelArtifact, ArtifactError> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(ArtifactError::NotFound(model_path));
        }

        let bytes = fs::read(&model_path).map_err(io_error(&model_path))?;
        self.verify_manifest(&bytes)?;

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        validate(&artifact)?;

        tracing::info!(
            "Loaded {} model from {:?} (held-out accuracy {:.4}, trained {})",
            artifact.model_name,
            model_path,
            artifact.held_out_accuracy,
            artifact.trained_at
        );
        Ok(artifact)
    }

    fn exists(&self) -> bool {
        self.model_path().exists()
    }
}
