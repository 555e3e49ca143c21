use super::{ApiError, ApiResult, DocumentUpload, RagBackend};
use crate::config::ApiConfig;
use crate::types::{QueryResponse, RebuildIndexResponse, UploadResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// reqwest-backed client for the document QA REST API
#[derive(Clone)]
pub struct RagClient {
    client: Client,
    config: ApiConfig,
}

// Error bodies look like {"error": "...", "traceback": "..."}
#[derive(Deserialize)]
struct BackendError {
    error: String,
}

impl RagClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<BackendError>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or(body);
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RagBackend for RagClient {
    async fn submit_query(&self, text: &str) -> ApiResult<QueryResponse> {
        let url = self.config.endpoint("query");
        tracing::debug!(%url, "submitting query");
        let response = self
            .client
            .post(url)
            .json(&json!({ "query": text }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn upload_document(&self, upload: DocumentUpload) -> ApiResult<UploadResponse> {
        let url = self.config.endpoint("upload");
        tracing::debug!(%url, file = %upload.file_name, bytes = upload.bytes.len(), "uploading document");
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(PDF_MEDIA_TYPE)?;
        let form = Form::new().part("file", part);
        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn rebuild_index(&self) -> ApiResult<RebuildIndexResponse> {
        let url = self.config.endpoint("rebuild-index");
        tracing::debug!(%url, "requesting index rebuild");
        let response = self.client.post(url).json(&json!({})).send().await?;
        Self::read_json(response).await
    }
}
