//! Receipts
//!
//! Loads receipt records from disk and uploads them one at a time through an
//! authenticated transport.

use std::path::Path;
use std::sync::Arc;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{PayloadError, UploadError};
use crate::types::Receipt;

const RECEIPTS_PATH: &str = "transaction-receipts";

/// Read a JSON array of receipts.
pub async fn load_receipts(path: impl AsRef<Path>) -> Result<Vec<Receipt>, PayloadError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let payload = tokio::fs::read(path).await.map_err(|e| PayloadError::Read {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let receipts: Vec<Receipt> =
        serde_json::from_slice(&payload).map_err(|e| PayloadError::InvalidJson {
            path: display,
            message: e.to_string(),
        })?;

    tracing::debug!(count = receipts.len(), "loaded receipts");
    Ok(receipts)
}

/// Uploads receipts to the transaction receipts endpoint.
pub struct ReceiptUploader<T: HttpTransport> {
    transport: Arc<T>,
    endpoint: String,
}

impl<T: HttpTransport> ReceiptUploader<T> {
    /// Create an uploader for the given API base URL.
    pub fn new(transport: Arc<T>, api_base_url: &str) -> Self {
        Self {
            transport,
            endpoint: format!("{}/{}", api_base_url.trim_end_matches('/'), RECEIPTS_PATH),
        }
    }

    /// Upload each receipt in order, stopping at the first failure.
    ///
    /// Returns the number uploaded.
    pub async fn upload_all(&self, receipts: &[Receipt]) -> Result<usize, UploadError> {
        let total = receipts.len();

        for (index, receipt) in receipts.iter().enumerate() {
            self.upload(index, receipt).await?;
            println!("Uploaded {}/{} receipts", index + 1, total);
        }

        Ok(total)
    }

    async fn upload(&self, index: usize, receipt: &Receipt) -> Result<(), UploadError> {
        let body = serde_json::to_string(receipt).map_err(|e| UploadError::Serialize {
            index,
            message: e.to_string(),
        })?;

        let request = HttpRequest::new(HttpMethod::Put, &self.endpoint)
            .with_header("content-type", "application/json")
            .with_body(body);

        let response = self.transport.send(request).await?.error_for_unauthorized()?;
        if !response.is_ok() {
            tracing::warn!(index, status = response.status, "receipt upload rejected");
            return Err(UploadError::UnexpectedStatus {
                index,
                status: response.status,
            });
        }

        tracing::debug!(external_id = %receipt.external_id, "receipt uploaded");
        Ok(())
    }
}
