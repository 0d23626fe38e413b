//! The backend trait consumed by the orchestration layer

use async_trait::async_trait;
use bytes::Bytes;

use dq_core::{Column, DatasetId, QueryState};

use crate::types::{AggregateRequest, AggregateResponse, FileList, FileSummary, RowPage, UploadResponse};
use crate::ApiError;

/// Remote row store and aggregation backend.
///
/// All dashboard I/O goes through this trait so the orchestration layer can
/// be exercised against an in-process fake.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// List uploaded files, paginated.
    async fn list_files(&self, page: u32, page_size: u32) -> Result<FileList, ApiError>;

    /// Fetch metadata for one file.
    async fn file_info(&self, id: DatasetId) -> Result<FileSummary, ApiError>;

    /// Delete an uploaded file.
    async fn delete_file(&self, id: DatasetId) -> Result<(), ApiError>;

    /// Upload a tabular file; parsing and schema inference happen remotely.
    async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<UploadResponse, ApiError>;

    /// Ordered column list with inferred types.
    async fn columns(&self, id: DatasetId) -> Result<Vec<Column>, ApiError>;

    /// One page of rows under the given query state.
    async fn rows(&self, id: DatasetId, query: &QueryState) -> Result<RowPage, ApiError>;

    /// Group-by aggregation over the full filtered/searched dataset.
    async fn aggregate(
        &self,
        id: DatasetId,
        request: &AggregateRequest,
    ) -> Result<AggregateResponse, ApiError>;

    /// Full filtered/searched dataset as a CSV byte stream.
    async fn export_csv(&self, id: DatasetId, query: &QueryState) -> Result<Bytes, ApiError>;
}
