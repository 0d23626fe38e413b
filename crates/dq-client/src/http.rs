//! HTTP implementation of the data backend

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use dq_core::{Column, DatasetId, QueryState};

use crate::backend::DataBackend;
use crate::types::{
    export_params, row_params, AggregateRequest, AggregateResponse, FileList, FileSummary,
    RowPage, UploadResponse,
};
use crate::ApiError;

/// Bounded timeout so an unreachable backend never hangs the UI.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared holder for the bearer credential.
///
/// The surrounding shell writes the token after login; the backend clears
/// it whenever the server rejects it, so the shell can fall back to an
/// unauthenticated state without a retry loop.
#[derive(Clone, Default)]
pub struct CredentialStore {
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}

/// Production [`DataBackend`] talking to the remote API over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url` (the `/api/v1` prefix is
    /// appended per request).
    pub fn new(base_url: impl Into<String>, credentials: CredentialStore) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transient(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/v1{path}", self.base_url);
        let mut req = self.client.request(method, url);
        if let Some(token) = self.credentials.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "backend request failed");
        let err = ApiError::from_status(status.as_u16(), body);
        if matches!(err, ApiError::Auth) {
            // The server rejected the credential; keeping it would only
            // produce more 401s.
            self.credentials.clear();
        }
        Err(err)
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transient("request timed out".to_owned())
    } else {
        ApiError::Transient(error.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::Transient(format!("failed to decode response: {e}")))
}

#[async_trait]
impl DataBackend for HttpBackend {
    async fn list_files(&self, page: u32, page_size: u32) -> Result<FileList, ApiError> {
        let req = self
            .request(Method::GET, "/files")
            .query(&[("page", page), ("page_size", page_size)]);
        decode(self.send(req).await?).await
    }

    async fn file_info(&self, id: DatasetId) -> Result<FileSummary, ApiError> {
        let req = self.request(Method::GET, &format!("/files/{id}"));
        decode(self.send(req).await?).await
    }

    async fn delete_file(&self, id: DatasetId) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/files/{id}"));
        self.send(req).await?;
        Ok(())
    }

    async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(contents).file_name(filename.to_owned());
        let form = Form::new().part("file", part);
        let req = self.request(Method::POST, "/files/upload").multipart(form);
        decode(self.send(req).await?).await
    }

    async fn columns(&self, id: DatasetId) -> Result<Vec<Column>, ApiError> {
        let req = self.request(Method::GET, &format!("/data/{id}/columns"));
        decode(self.send(req).await?).await
    }

    async fn rows(&self, id: DatasetId, query: &QueryState) -> Result<RowPage, ApiError> {
        let req = self
            .request(Method::GET, &format!("/data/{id}/rows"))
            .query(&row_params(query));
        decode(self.send(req).await?).await
    }

    async fn aggregate(
        &self,
        id: DatasetId,
        request: &AggregateRequest,
    ) -> Result<AggregateResponse, ApiError> {
        let req = self
            .request(Method::POST, &format!("/data/{id}/aggregate"))
            .json(request);
        decode(self.send(req).await?).await
    }

    async fn export_csv(&self, id: DatasetId, query: &QueryState) -> Result<Bytes, ApiError> {
        let req = self
            .request(Method::GET, &format!("/data/{id}/export"))
            .query(&export_params(query));
        self.send(req)
            .await?
            .bytes()
            .await
            .map_err(|e| ApiError::Transient(format!("failed to read export stream: {e}")))
    }
}
