/// API module for the document QA backend
///
/// Wraps the three REST calls the UI issues. Every call is a single request
/// with no retry; failures come back as [`ApiError`] for the caller to turn
/// into a notice or a fallback answer.
///
/// # Architecture
///
/// - `RagBackend` - the seam the conversation flows are written against
/// - `client` - `RagClient`, the reqwest implementation
///
/// # Usage
///
/// ```rust,no_run
/// use docquery::api::{RagBackend, RagClient};
/// use docquery::config::ApiConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RagClient::new(ApiConfig::from_env()?);
/// let response = client.submit_query("What is the refund policy?").await?;
/// println!("{}", response.answer);
/// # Ok(())
/// # }
/// ```
mod client;

use crate::types::{QueryResponse, RebuildIndexResponse, UploadResponse};
use async_trait::async_trait;

pub use client::RagClient;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Multipart payload for `/upload/`.
#[derive(Clone, Debug)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn submit_query(&self, text: &str) -> ApiResult<QueryResponse>;

    async fn upload_document(&self, upload: DocumentUpload) -> ApiResult<UploadResponse>;

    async fn rebuild_index(&self) -> ApiResult<RebuildIndexResponse>;
}
