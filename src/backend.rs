//! Filesystem-backed [`MediaBackend`].
//!
//! Layout under the data directory:
//! - `staging/`   encoded edits waiting to be relocated
//! - `protected/` the protected area
//! - `shared/`    files handed to the share mechanism
//! - `protected.key` blake3 digest of the protected-area credential
//!
//! Edited images are written over the original with a `.edit.json` sidecar
//! recording the parameters.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::editor::EditParams;
use crate::error::ViewerError;
use crate::services::MediaBackend;

const KEY_FILE: &str = "protected.key";
const KEY_CONTEXT: &[u8] = b"mediaview protected area v1";

/// Provenance written next to an edited image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    /// CSS filter function, empty when no filter was applied.
    pub filter: String,
    pub brightness: u16,
    pub contrast: u16,
    pub saved_at: i64,
}

impl EditRecord {
    fn new(params: EditParams) -> Self {
        Self {
            filter: params.filter.css().to_string(),
            brightness: params.brightness.value(),
            contrast: params.contrast.value(),
            saved_at: now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsBackend {
    data_dir: PathBuf,
}

impl FsBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join("staging")
    }

    pub fn protected_dir(&self) -> PathBuf {
        self.data_dir.join("protected")
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.data_dir.join("shared")
    }

    fn key_path(&self) -> PathBuf {
        self.data_dir.join(KEY_FILE)
    }

    /// Sidecar path for an edited image.
    pub fn sidecar_path(original: &Path) -> PathBuf {
        let mut name = original.as_os_str().to_os_string();
        name.push(".edit.json");
        PathBuf::from(name)
    }

    /// Creates the protected area and stores the credential digest.
    pub async fn setup_protected_area(&self, credential: &str) -> Result<()> {
        anyhow::ensure!(!credential.is_empty(), "Credential must not be empty");
        tokio::fs::create_dir_all(self.protected_dir())
            .await
            .with_context(|| format!("Failed to create {:?}", self.protected_dir()))?;
        tokio::fs::write(self.key_path(), digest(credential))
            .await
            .with_context(|| format!("Failed to write {:?}", self.key_path()))?;
        info!("Protected area set up at {:?}", self.protected_dir());
        Ok(())
    }

    async fn verify_credential(&self, credential: &str) -> Result<bool> {
        let stored = tokio::fs::read_to_string(self.key_path())
            .await
            .with_context(|| format!("Failed to read {:?}", self.key_path()))?;
        Ok(stored.trim() == digest(credential))
    }

    async fn write_edit(&self, bytes: &[u8], original: &Path, params: EditParams) -> Result<()> {
        tokio::fs::write(original, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", original))?;

        let record = serde_json::to_string_pretty(&EditRecord::new(params))
            .context("Failed to serialize edit record")?;
        let sidecar = Self::sidecar_path(original);
        tokio::fs::write(&sidecar, record)
            .await
            .with_context(|| format!("Failed to write {:?}", sidecar))?;
        Ok(())
    }

    async fn write_staged(&self, bytes: &[u8], original: &Path) -> Result<PathBuf> {
        let dir = self.staging_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {:?}", dir))?;

        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "edited".to_string());
        let hash = xxh3_64(original.to_string_lossy().as_bytes());
        let staged = dir.join(format!("{}-{:016x}.png", stem, hash));

        tokio::fs::write(&staged, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", staged))?;
        debug!("Staged edit for {:?} at {:?}", original, staged);
        Ok(staged)
    }

    async fn relocate(&self, path: &Path, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {:?}", dir))?;
        let target = unique_target(dir, path).await?;

        if let Err(e) = tokio::fs::rename(path, &target).await {
            // Cross-device moves fall back to copy and remove.
            debug!("Rename failed ({}), copying {:?} instead", e, path);
            tokio::fs::copy(path, &target)
                .await
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, target))?;
            tokio::fs::remove_file(path)
                .await
                .with_context(|| format!("Failed to remove {:?}", path))?;
        }
        Ok(target)
    }
}

impl MediaBackend for FsBackend {
    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>, ViewerError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| ViewerError::io(path, e))
    }

    async fn share_file(&self, path: &Path) -> Result<(), ViewerError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ViewerError::Share(format!("{} does not exist", path.display())));
        }
        let shared_dir = self.shared_dir();
        let result: Result<PathBuf> = async {
            tokio::fs::create_dir_all(&shared_dir)
                .await
                .with_context(|| format!("Failed to create {:?}", shared_dir))?;
            let target = unique_target(&shared_dir, path).await?;
            tokio::fs::copy(path, &target)
                .await
                .with_context(|| format!("Failed to copy {:?}", path))?;
            Ok(target)
        }
        .await;

        let target = result.map_err(|e| ViewerError::Share(format!("{:#}", e)))?;
        info!("Shared {:?} as {:?}", path, target);
        Ok(())
    }

    async fn save_edited_image(
        &self,
        bytes: Vec<u8>,
        original: &Path,
        params: EditParams,
    ) -> Result<(), ViewerError> {
        self.write_edit(&bytes, original, params)
            .await
            .map_err(|e| ViewerError::Save(format!("{:#}", e)))
    }

    async fn save_temp_image(
        &self,
        bytes: Vec<u8>,
        original: &Path,
    ) -> Result<PathBuf, ViewerError> {
        self.write_staged(&bytes, original)
            .await
            .map_err(|e| ViewerError::Save(format!("{:#}", e)))
    }

    async fn discard_staged(&self, staged: &Path) -> Result<(), ViewerError> {
        match tokio::fs::remove_file(staged).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ViewerError::io(staged, e)),
        }
    }

    async fn check_protected_area_ready(&self) -> Result<bool, ViewerError> {
        tokio::fs::try_exists(self.key_path())
            .await
            .map_err(|e| ViewerError::io(self.key_path(), e))
    }

    async fn move_to_protected_area(&self, path: &Path, credential: &str) -> Result<(), ViewerError> {
        let verified = self
            .verify_credential(credential)
            .await
            .map_err(|e| ViewerError::Move(format!("{:#}", e)))?;
        if !verified {
            warn!("Rejected protected-area credential");
            return Err(ViewerError::Auth("incorrect password".to_string()));
        }

        let target = self
            .relocate(path, &self.protected_dir())
            .await
            .map_err(|e| ViewerError::Move(format!("{:#}", e)))?;
        info!("Moved {:?} to {:?}", path, target);
        Ok(())
    }
}

fn digest(credential: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(KEY_CONTEXT);
    hasher.update(credential.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// `dir/<file name>`, or `dir/<stem>-N.<ext>` if that is taken.
async fn unique_target(dir: &Path, path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?;
    let candidate = dir.join(name);
    if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        return Ok(candidate);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}-{}{}", stem, n, ext));
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Ok(candidate);
        }
        n += 1;
    }
}
