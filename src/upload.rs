//! Upload Store
//!
//! TigerStyle: Findings pushed to a remote upload URL over HTTP.
//!
//! The upload URL belongs to one scan (typically a pre-signed bucket URL
//! handed out by the defect tracker). Findings are `PUT` as a JSON array;
//! `GET` on the same URL reads them back.
//!
//! Failures:
//! - transport faults (connect, timeout, TLS) keep the `reqwest::Error` as cause
//! - a non-2xx status fails without cause; the message carries status and body

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use crate::error::{PersistenceContext, PersistenceError, PersistenceResult};
use crate::finding::Finding;
use crate::store::{validate_scan_name, FindingStore};
use crate::{UPLOAD_ERROR_BODY_BYTES_MAX, UPLOAD_TIMEOUT_SECS_DEFAULT};

// =============================================================================
// UploadStore
// =============================================================================

/// Stores findings by uploading them to a URL.
#[derive(Debug, Clone)]
pub struct UploadStore {
    client: Client,
    upload_url: Url,
}

impl UploadStore {
    /// Create a store for `upload_url` with the default request timeout.
    pub fn new(upload_url: &str) -> PersistenceResult<Self> {
        Self::with_timeout(upload_url, Duration::from_secs(UPLOAD_TIMEOUT_SECS_DEFAULT))
    }

    /// Create a store for `upload_url` with a custom request timeout.
    pub fn with_timeout(upload_url: &str, timeout: Duration) -> PersistenceResult<Self> {
        let upload_url = Url::parse(upload_url)
            .with_persistence_context(|| format!("invalid upload url '{upload_url}'"))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .persistence_context("failed to build HTTP client")?;
        Ok(Self { client, upload_url })
    }

    /// Use an existing client, e.g. one shared with other stores.
    pub fn with_client(client: Client, upload_url: Url) -> Self {
        Self { client, upload_url }
    }

    /// Target URL.
    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }
}

/// Turn a non-2xx response into a failure carrying status and body.
async fn check_status(response: Response, action: &str, scan: &str) -> PersistenceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => truncate_body(body),
        Err(e) => format!("<unreadable body: {e}>"),
    };
    Err(PersistenceError::new(format!(
        "{action} of scan '{scan}' returned non 2xx status code ({status}): {body}"
    )))
}

fn truncate_body(mut body: String) -> String {
    if body.len() > UPLOAD_ERROR_BODY_BYTES_MAX {
        let mut end = UPLOAD_ERROR_BODY_BYTES_MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

#[async_trait]
impl FindingStore for UploadStore {
    async fn store_findings(&self, scan: &str, findings: &[Finding]) -> PersistenceResult<usize> {
        validate_scan_name(scan)?;
        tracing::debug!(scan, url = %self.upload_url, count = findings.len(), "uploading findings");

        let response = self
            .client
            .put(self.upload_url.clone())
            .json(findings)
            .send()
            .await
            .with_persistence_context(|| {
                format!("Failed to upload findings of scan '{scan}' to {}", self.upload_url)
            })?;
        check_status(response, "upload", scan).await?;

        tracing::info!(scan, count = findings.len(), "uploaded findings");
        Ok(findings.len())
    }

    async fn load_findings(&self, scan: &str) -> PersistenceResult<Vec<Finding>> {
        validate_scan_name(scan)?;

        let response = self
            .client
            .get(self.upload_url.clone())
            .send()
            .await
            .with_persistence_context(|| {
                format!("Failed to fetch findings of scan '{scan}' from {}", self.upload_url)
            })?;
        let response = check_status(response, "download", scan).await?;

        response
            .json::<Vec<Finding>>()
            .await
            .with_persistence_context(|| format!("invalid findings returned for scan '{scan}'"))
    }
}

// =============================================================================
// Tests
// =============================================================================
