//! Wire types and parameter serialization for the backend API

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use dq_core::{DatasetId, QueryState};

/// One row of a dataset, keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Summary of an uploaded file as reported by `GET /files`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSummary {
    pub id: DatasetId,
    pub filename: String,
    pub row_count: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Paginated file listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileList {
    pub files: Vec<FileSummary>,
    pub total: u64,
}

/// Response to a multipart file upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub id: DatasetId,
    pub filename: String,
    pub row_count: u64,
    pub columns: Vec<String>,
}

/// One page of rows plus the total count under the current query.
///
/// Each fetch supersedes the previous page wholesale; pages are never
/// merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowPage {
    pub rows: Vec<Record>,
    pub total: u64,
}

/// One metric entry of an aggregation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub col: String,
    pub agg: String,
}

/// Body of `POST /data/{id}/aggregate`.
///
/// Aggregation runs over the full filtered/searched dataset: pagination and
/// sort are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub group_by: Vec<String>,
    pub metrics: Vec<MetricSpec>,
    pub filters: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Aggregation response: one record per group, holding the dimension key
/// and a `<col>_<agg>` value per metric.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateResponse {
    pub data: Vec<Record>,
}

/// Serialize a query state into `GET /data/{id}/rows` parameters.
///
/// `search` is omitted when empty and `filters` is omitted when empty
/// (never sent as `"{}"`); `sort_by` is omitted until a sort is chosen
/// while `sort_dir` is always sent.
pub fn row_params(query: &QueryState) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page().to_string()),
        ("page_size", query.page_size().to_string()),
    ];
    if let Some(sort_by) = query.sort_by() {
        params.push(("sort_by", sort_by.to_owned()));
    }
    params.push(("sort_dir", query.sort_dir().as_str().to_owned()));
    params.extend(filter_params(query));
    params
}

/// Serialize a query state into `GET /data/{id}/export` parameters.
///
/// The export reproduces the filter/search state only; the full dataset is
/// streamed without pagination or sort.
pub fn export_params(query: &QueryState) -> Vec<(&'static str, String)> {
    filter_params(query)
}

fn filter_params(query: &QueryState) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !query.search().is_empty() {
        params.push(("search", query.search().to_owned()));
    }
    if !query.filters().is_empty() {
        // Filters travel as a JSON-encoded mapping in a single parameter.
        let encoded = serde_json::to_string(query.filters())
            .unwrap_or_else(|_| String::from("{}"));
        params.push(("filters", encoded));
    }
    params
}
