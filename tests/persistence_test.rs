//! Persistence failures as seen by calling code.

use std::io;
use std::sync::{Arc, Mutex};

use persistence_defectdojo::{
    import_findings, Finding, FindingStore, JsonFileStore, PersistenceError, PersistenceResult,
    Severity, UploadStore,
};

const UPLOAD_FAILED: &str = "Failed to upload finding to DefectDojo";

/// Store that always fails, optionally with a network fault as cause.
struct UnreachableTracker {
    with_timeout: bool,
}

#[async_trait::async_trait]
impl FindingStore for UnreachableTracker {
    async fn store_findings(&self, _scan: &str, _findings: &[Finding]) -> PersistenceResult<usize> {
        if self.with_timeout {
            Err(PersistenceError::with_cause(
                UPLOAD_FAILED,
                io::Error::new(io::ErrorKind::TimedOut, "network timeout"),
            ))
        } else {
            Err(PersistenceError::new(UPLOAD_FAILED))
        }
    }

    async fn load_findings(&self, _scan: &str) -> PersistenceResult<Vec<Finding>> {
        Ok(Vec::new())
    }
}

fn open_port() -> Finding {
    Finding::new("Open mysql Port", "Open Port", Severity::Informational)
}

#[tokio::test]
async fn test_failure_without_cause_reaches_caller() {
    let tracker = UnreachableTracker { with_timeout: false };

    let err = import_findings(&tracker, "scan", vec![open_port()])
        .await
        .unwrap_err();

    assert_eq!(err.message(), UPLOAD_FAILED);
    assert!(err.cause().is_none());
}

#[tokio::test]
async fn test_failure_with_timeout_cause_is_traversable() {
    let tracker = UnreachableTracker { with_timeout: true };

    let err = import_findings(&tracker, "scan", vec![open_port()])
        .await
        .unwrap_err();

    assert_eq!(err.message(), UPLOAD_FAILED);
    let timeout = err
        .cause()
        .and_then(|c| c.downcast_ref::<io::Error>())
        .expect("cause should be the network timeout");
    assert_eq!(timeout.kind(), io::ErrorKind::TimedOut);
    assert_eq!(err.report(), format!("{UPLOAD_FAILED}\n  caused by: network timeout"));
}

/// Pipeline step that never names `PersistenceError` in its signature.
async fn run_pipeline(store: &dyn FindingStore) -> anyhow::Result<usize> {
    let stored = import_findings(store, "scan", vec![open_port()]).await?;
    Ok(stored)
}

#[tokio::test]
async fn test_propagates_through_untyped_callers() {
    let tracker = UnreachableTracker { with_timeout: true };

    let err = run_pipeline(&tracker).await.unwrap_err();

    let persistence = err
        .downcast_ref::<PersistenceError>()
        .expect("persistence error should survive propagation");
    assert_eq!(persistence.message(), UPLOAD_FAILED);
    assert_eq!(err.chain().count(), 2);
}

/// Records an event when dropped.
struct ConnectionGuard(Arc<Mutex<Vec<&'static str>>>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.lock().unwrap().push("connection released");
    }
}

async fn upload_with_connection(
    tracker: &UnreachableTracker,
    events: Arc<Mutex<Vec<&'static str>>>,
) -> PersistenceResult<usize> {
    let _connection = ConnectionGuard(events);
    let stored = import_findings(tracker, "scan", vec![open_port()]).await?;
    Ok(stored)
}

#[tokio::test]
async fn test_scoped_resources_released_before_handler() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let tracker = UnreachableTracker { with_timeout: false };

    match upload_with_connection(&tracker, Arc::clone(&events)).await {
        Ok(_) => panic!("upload should fail"),
        Err(e) => {
            let mut events = events.lock().unwrap();
            assert_eq!(*events, vec!["connection released"]);
            events.push("handler saw error");
            assert_eq!(e.message(), UPLOAD_FAILED);
        }
    }

    assert_eq!(
        *events.lock().unwrap(),
        vec!["connection released", "handler saw error"]
    );
}

#[tokio::test]
async fn test_error_crosses_task_boundary() {
    let handle = tokio::spawn(async {
        let tracker = UnreachableTracker { with_timeout: true };
        import_findings(&tracker, "scan", vec![open_port()]).await
    });

    let err = handle.await.unwrap().unwrap_err();
    assert!(err.has_cause());
}

#[tokio::test]
async fn test_file_store_import_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path()).await.unwrap();

    let count = import_findings(&store, "nmap-localhost", vec![open_port()])
        .await
        .unwrap();
    let stored = store.load_findings("nmap-localhost").await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(stored[0].name, "Open mysql Port");
}

#[tokio::test]
async fn test_upload_rejected_by_tracker_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("PUT", "/api/v2/import-scan/")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let url = format!("{}/api/v2/import-scan/", server.url()).parse().unwrap();
    let store = UploadStore::with_client(client, url);

    let err = run_pipeline(&store).await.unwrap_err();

    let persistence = err.downcast_ref::<PersistenceError>().unwrap();
    assert!(persistence.message().contains("(500 Internal Server Error)"));
    assert!(persistence.report().contains("internal error"));
}
