//! Import step: read parser output, stamp, validate, persist.

use std::path::Path;

use chrono::Utc;

use crate::error::{PersistenceContext, PersistenceError, PersistenceResult};
use crate::finding::{stamp_all, Finding};
use crate::store::FindingStore;

/// Read a JSON array of findings from a file.
pub async fn read_findings_file(path: &Path) -> PersistenceResult<Vec<Finding>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_persistence_context(|| format!("failed to read findings file {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_persistence_context(|| format!("failed to parse findings file {}", path.display()))
}

/// Stamp, validate and store the findings of one scan.
///
/// Nothing is stored if any finding is invalid. Returns the number of
/// findings stored.
pub async fn import_findings<S>(
    store: &S,
    scan: &str,
    mut findings: Vec<Finding>,
) -> PersistenceResult<usize>
where
    S: FindingStore + ?Sized,
{
    tracing::info!(scan, count = findings.len(), "importing findings");

    stamp_all(&mut findings, Utc::now());

    for (index, finding) in findings.iter().enumerate() {
        if let Err(e) = finding.validate() {
            tracing::debug!(scan, index, error = %e, "rejecting invalid finding");
            return Err(PersistenceError::with_cause(
                format!("finding #{index} of scan '{scan}' is not valid"),
                e,
            ));
        }
    }

    store.store_findings(scan, &findings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{FindingError, Severity};
    use crate::store::JsonFileStore;
    use tempfile::tempdir;

    #[test]
    fn test_import_stamps_before_storing() {
        tokio_test::block_on(async {
            let dir = tempdir().unwrap();
            let store = JsonFileStore::new(dir.path()).await.unwrap();
            let findings = vec![Finding::new("Open mysql Port", "Open Port", Severity::Informational)];

            let count = import_findings(&store, "scan", findings).await.unwrap();
            assert_eq!(count, 1);

            let stored = store.load_findings("scan").await.unwrap();
            assert!(!stored[0].id.is_nil());
            assert!(stored[0].parsed_at.is_some());
        });
    }

    #[tokio::test]
    async fn test_invalid_finding_aborts_with_cause() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        let findings = vec![
            Finding::new("Open mysql Port", "Open Port", Severity::Low),
            Finding::new("", "Open Port", Severity::Low),
        ];

        let err = import_findings(&store, "scan", findings).await.unwrap_err();

        assert_eq!(err.message(), "finding #1 of scan 'scan' is not valid");
        let cause = err
            .cause()
            .and_then(|c| c.downcast_ref::<FindingError>())
            .unwrap();
        assert!(matches!(cause, FindingError::EmptyName { .. }));
        assert!(!store.scan_path("scan").exists());
    }

    #[tokio::test]
    async fn test_read_findings_file_missing() {
        let dir = tempdir().unwrap();
        let err = read_findings_file(&dir.path().join("nope.json")).await.unwrap_err();

        let io = err.cause().unwrap().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_findings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("findings.json");
        std::fs::write(
            &path,
            r#"[{"name": "Open mysql Port", "category": "Open Port", "severity": "HIGH"}]"#,
        )
        .unwrap();

        let findings = read_findings_file(&path).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }
}
