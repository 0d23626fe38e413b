//! Programmable in-process backend for session tests
//!
//! Replies are queued per endpoint in call order. A gated row reply parks
//! the call on a oneshot channel so tests can force responses to arrive
//! out of order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use dq_client::{
    AggregateRequest, AggregateResponse, ApiError, DataBackend, FileList, FileSummary, Record,
    RowPage, UploadResponse,
};
use dq_core::{Column, DatasetId, QueryState};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Build a row page from JSON object literals.
pub fn page_of(rows: &[serde_json::Value], total: u64) -> RowPage {
    RowPage {
        rows: rows.iter().map(as_record).collect(),
        total,
    }
}

fn as_record(value: &serde_json::Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

enum RowsReply {
    Ready(Result<RowPage, ApiError>),
    Gated(oneshot::Receiver<Result<RowPage, ApiError>>),
}

#[derive(Default)]
pub struct MockBackend {
    columns: Mutex<VecDeque<Result<Vec<Column>, ApiError>>>,
    rows: Mutex<VecDeque<RowsReply>>,
    aggregates: Mutex<VecDeque<Result<Vec<serde_json::Value>, ApiError>>>,
    exports: Mutex<VecDeque<Result<Bytes, ApiError>>>,
    seen_rows: Mutex<Vec<QueryState>>,
    seen_aggregates: Mutex<Vec<(DatasetId, AggregateRequest)>>,
    seen_exports: Mutex<Vec<(DatasetId, QueryState)>>,
    rows_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_columns(&self, reply: Result<Vec<Column>, ApiError>) {
        self.columns.lock().push_back(reply);
    }

    pub fn push_rows(&self, reply: Result<RowPage, ApiError>) {
        self.rows.lock().push_back(RowsReply::Ready(reply));
    }

    /// Queue a row reply that blocks until the returned sender fires.
    pub fn push_rows_gated(&self) -> oneshot::Sender<Result<RowPage, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.rows.lock().push_back(RowsReply::Gated(rx));
        tx
    }

    pub fn push_aggregate(&self, reply: Result<Vec<serde_json::Value>, ApiError>) {
        self.aggregates.lock().push_back(reply);
    }

    pub fn push_export(&self, reply: Result<Bytes, ApiError>) {
        self.exports.lock().push_back(reply);
    }

    pub fn seen_rows(&self) -> Vec<QueryState> {
        self.seen_rows.lock().clone()
    }

    pub fn seen_aggregates(&self) -> Vec<(DatasetId, AggregateRequest)> {
        self.seen_aggregates.lock().clone()
    }

    pub fn seen_exports(&self) -> Vec<(DatasetId, QueryState)> {
        self.seen_exports.lock().clone()
    }

    pub fn rows_calls(&self) -> usize {
        self.rows_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataBackend for MockBackend {
    async fn list_files(&self, _page: u32, _page_size: u32) -> Result<FileList, ApiError> {
        Err(ApiError::Validation("not scripted in mock".to_owned()))
    }

    async fn file_info(&self, _id: DatasetId) -> Result<FileSummary, ApiError> {
        Err(ApiError::Validation("not scripted in mock".to_owned()))
    }

    async fn delete_file(&self, _id: DatasetId) -> Result<(), ApiError> {
        Err(ApiError::Validation("not scripted in mock".to_owned()))
    }

    async fn upload(&self, _filename: &str, _contents: Vec<u8>) -> Result<UploadResponse, ApiError> {
        Err(ApiError::Validation("not scripted in mock".to_owned()))
    }

    async fn columns(&self, _id: DatasetId) -> Result<Vec<Column>, ApiError> {
        self.columns
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transient("mock columns queue empty".to_owned())))
    }

    async fn rows(&self, _id: DatasetId, query: &QueryState) -> Result<RowPage, ApiError> {
        self.rows_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_rows.lock().push(query.clone());
        let reply = self.rows.lock().pop_front();
        match reply {
            Some(RowsReply::Ready(result)) => result,
            Some(RowsReply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Transient("gate dropped".to_owned()))),
            None => Err(ApiError::Transient("mock rows queue empty".to_owned())),
        }
    }

    async fn aggregate(
        &self,
        id: DatasetId,
        request: &AggregateRequest,
    ) -> Result<AggregateResponse, ApiError> {
        self.seen_aggregates.lock().push((id, request.clone()));
        match self.aggregates.lock().pop_front() {
            Some(Ok(data)) => Ok(AggregateResponse {
                data: data.iter().map(as_record).collect(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(ApiError::Transient("mock aggregate queue empty".to_owned())),
        }
    }

    async fn export_csv(&self, id: DatasetId, query: &QueryState) -> Result<Bytes, ApiError> {
        self.seen_exports.lock().push((id, query.clone()));
        self.exports
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transient("mock export queue empty".to_owned())))
    }
}
