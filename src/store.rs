//! Finding Store
//!
//! TigerStyle: Abstract persistence, local and remote backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              FindingStore Trait              │
//! └─────────────────────────────────────────────┘
//!          ↑                              ↑
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │  JsonFileStore  │           │   UploadStore   │
//! │  (local files)  │           │  (HTTP upload)  │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! `JsonFileStore` writes `<dir>/<scan>.findings.json` through a per-write
//! temp file renamed into place.
//!
//! Every failure leaves the store as a `PersistenceError`. Faults from the
//! filesystem or serde are kept as its cause.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::{PersistenceContext, PersistenceError, PersistenceResult};
use crate::finding::Finding;
use crate::{FINDINGS_FILE_SUFFIX, SCAN_NAME_BYTES_MAX};

// =============================================================================
// Trait
// =============================================================================

/// Persistence target for scan findings.
#[async_trait]
pub trait FindingStore: Send + Sync {
    /// Store all findings of a scan, replacing earlier ones.
    ///
    /// Returns the number of findings written.
    async fn store_findings(&self, scan: &str, findings: &[Finding]) -> PersistenceResult<usize>;

    /// Load the findings previously stored for a scan.
    async fn load_findings(&self, scan: &str) -> PersistenceResult<Vec<Finding>>;
}

/// Check that a scan name is usable as a storage key.
pub fn validate_scan_name(scan: &str) -> PersistenceResult<()> {
    if scan.trim().is_empty() {
        return Err(PersistenceError::new("scan name cannot be empty"));
    }
    if scan.len() > SCAN_NAME_BYTES_MAX {
        return Err(PersistenceError::new(format!(
            "scan name too long: {} > {}",
            scan.len(),
            SCAN_NAME_BYTES_MAX
        )));
    }
    if scan.contains(['/', '\\']) || scan == "." || scan == ".." {
        return Err(PersistenceError::new(format!(
            "scan name '{scan}' must not contain path separators"
        )));
    }
    Ok(())
}

// =============================================================================
// JsonFileStore
// =============================================================================

/// Stores each scan as a JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create the store, creating `dir` if needed.
    pub async fn new(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_persistence_context(|| {
                format!("failed to create data directory {}", dir.display())
            })?;
        tracing::debug!(dir = %dir.display(), "finding store ready");
        Ok(Self { dir })
    }

    /// Directory holding the scan files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a scan's findings.
    pub fn scan_path(&self, scan: &str) -> PathBuf {
        self.dir.join(format!("{scan}{FINDINGS_FILE_SUFFIX}"))
    }

    /// Unique temp file for one write of a scan. Concurrent writers of the
    /// same scan never share it.
    fn temp_path(&self, scan: &str) -> PathBuf {
        self.dir.join(format!(
            ".{scan}{FINDINGS_FILE_SUFFIX}.{}.tmp",
            Uuid::new_v4().simple()
        ))
    }
}

#[async_trait]
impl FindingStore for JsonFileStore {
    async fn store_findings(&self, scan: &str, findings: &[Finding]) -> PersistenceResult<usize> {
        validate_scan_name(scan)?;

        let path = self.scan_path(scan);
        let tmp_path = self.temp_path(scan);

        let content = serde_json::to_vec_pretty(findings)
            .with_persistence_context(|| format!("failed to serialize findings of scan '{scan}'"))?;

        fs::write(&tmp_path, &content)
            .await
            .with_persistence_context(|| format!("failed to write {}", tmp_path.display()))?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                tracing::warn!(path = %tmp_path.display(), error = %cleanup, "failed to remove temp file");
            }
            return Err(PersistenceError::with_cause(
                format!("failed to move findings into {}", path.display()),
                e,
            ));
        }

        tracing::info!(scan, count = findings.len(), path = %path.display(), "stored findings");
        Ok(findings.len())
    }

    async fn load_findings(&self, scan: &str) -> PersistenceResult<Vec<Finding>> {
        validate_scan_name(scan)?;

        let path = self.scan_path(scan);
        if !fs::try_exists(&path)
            .await
            .with_persistence_context(|| format!("failed to access {}", path.display()))?
        {
            return Err(PersistenceError::new(format!(
                "no findings stored for scan '{scan}'"
            )));
        }

        let bytes = fs::read(&path)
            .await
            .with_persistence_context(|| format!("failed to read {}", path.display()))?;
        let findings: Vec<Finding> = serde_json::from_slice(&bytes)
            .with_persistence_context(|| format!("corrupted findings file {}", path.display()))?;

        tracing::debug!(scan, count = findings.len(), "loaded findings");
        Ok(findings)
    }
}

// =============================================================================
// Tests
// =============================================================================
