//! HTTP client for the document classification service.
//!
//! The service exposes `/health`, `/documents` and `/upload`. Handlers and
//! workflows talk to it through [`ClassifierApi`] so that tests can swap in
//! a fake.

use crate::config::ClassifierServiceSettings;
use crate::models::{DocumentRecord, ServiceErrorBody, UploadFile, UploadReceipt};
use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::de::DeserializeOwned;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("upload rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("invalid upload request: {0}")]
    InvalidRequest(#[source] reqwest::Error),
}

#[async_trait]
pub trait ClassifierApi: Send + Sync {
    /// Liveness probe. The body is returned as-is.
    async fn health(&self) -> Result<serde_json::Value, ClientError>;

    /// All previously classified documents, in service order.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError>;

    /// Submit one file for classification.
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt, ClientError>;
}

pub struct ClassifierClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl ClassifierClient {
    pub fn new(settings: &ClassifierServiceSettings) -> anyhow::Result<Self> {
        let client = Client::builder().build().map_err(|e| {
            tracing::error!("Failed to build classifier HTTP client: {}", e);
            anyhow::anyhow!("HTTP client construction failed: {}", e)
        })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: settings.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let bytes = response.bytes().await.map_err(|e| ClientError::Transport {
        url: url.to_string(),
        source: e,
    })?;

    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn record_request(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!(
        "classifier_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

#[async_trait]
impl ClassifierApi for ClassifierClient {
    async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let url = self.url("/health");

        let response = self
            .client
            .traced_get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                record_request("/health", "transport_error");
                ClientError::Transport {
                    url: url.clone(),
                    source: e,
                }
            })?;

        let body = read_json(&url, response).await;
        record_request("/health", if body.is_ok() { "ok" } else { "decode_error" });
        body
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError> {
        let url = self.url("/documents");

        let response = self
            .client
            .traced_get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                record_request("/documents", "transport_error");
                ClientError::Transport {
                    url: url.clone(),
                    source: e,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            record_request("/documents", "http_error");
            return Err(ClientError::Status { url, status });
        }

        let documents: Vec<DocumentRecord> = read_json(&url, response).await.inspect_err(|_| {
            record_request("/documents", "decode_error");
        })?;

        record_request("/documents", "ok");
        tracing::debug!(count = documents.len(), "Fetched document list");
        Ok(documents)
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt, ClientError> {
        let url = self.url("/upload");
        let filename = file.filename.clone();
        let size = file.data.len();

        let part = multipart::Part::bytes(file.data)
            .file_name(file.filename)
            .mime_str(&file.content_type)
            .map_err(ClientError::InvalidRequest)?;
        let form = multipart::Form::new().part("file", part);

        tracing::info!(filename = %filename, size, "Forwarding upload to classifier");

        let response = self
            .client
            .traced_post(&url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                record_request("/upload", "transport_error");
                ClientError::Transport {
                    url: url.clone(),
                    source: e,
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let receipt: UploadReceipt = read_json(&url, response).await.inspect_err(|_| {
                record_request("/upload", "decode_error");
            })?;
            record_request("/upload", "ok");
            return Ok(receipt);
        }

        record_request("/upload", "rejected");
        // Body is best-effort: fall back to the status text when it is not JSON.
        let message = read_json::<ServiceErrorBody>(&url, response)
            .await
            .ok()
            .and_then(ServiceErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Upload failed")
                    .to_string()
            });

        Err(ClientError::Rejected { status, message })
    }
}
