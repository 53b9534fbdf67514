//! DefectDojo Persistence Hook
//!
//! Stores security scan findings and reports failures as a single typed
//! error, `PersistenceError`, carrying a message and an optional cause.
//!
//! ```text
//! findings.json ──► import ──► FindingStore ─┬─► <data_dir>/<scan>.findings.json
//!                     │              │        └─► PUT <upload_url>
//!                     └── PersistenceError(message, cause?) ──► caller
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use persistence_defectdojo::{import_findings, Finding, JsonFileStore, Severity};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = JsonFileStore::new("/tmp/findings").await?;
//! let findings = vec![Finding::new("Open mysql Port", "Open Port", Severity::Informational)];
//! import_findings(&store, "nmap-localhost", findings).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod finding;
pub mod import;
pub mod store;
pub mod upload;

pub use error::{BoxedCause, PersistenceContext, PersistenceError, PersistenceResult};
pub use finding::{Finding, FindingError, Severity};
pub use import::{import_findings, read_findings_file};
pub use store::{FindingStore, JsonFileStore};
pub use upload::UploadStore;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "persistence-defectdojo";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default data directory for stored findings
pub const DATA_DIR_DEFAULT: &str = "~/.defectdojo-hook";

/// Scan name used when none is configured
pub const SCAN_NAME_DEFAULT: &str = "default";

/// Suffix of per-scan findings files
pub const FINDINGS_FILE_SUFFIX: &str = ".findings.json";

/// Maximum scan name length in bytes
pub const SCAN_NAME_BYTES_MAX: usize = 253;

/// Maximum finding name length in bytes
pub const FINDING_NAME_BYTES_MAX: usize = 4_096;

/// Default timeout for one upload request in seconds
pub const UPLOAD_TIMEOUT_SECS_DEFAULT: u64 = 30;

/// Maximum response body length kept in an upload failure message
pub const UPLOAD_ERROR_BODY_BYTES_MAX: usize = 2_048;
