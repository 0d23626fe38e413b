//! Core functionality for the data dashboard
//!
//! This crate provides the pure query-state and chart-derivation logic
//! driving the dashboard. It performs no I/O: the remote backend and the
//! orchestration layer live in `dq-client` and `dq-session`.

pub mod chart;
pub mod query;
pub mod schema;
pub mod token;

// Re-export commonly used types
pub use chart::{ChartQuery, ChartSeries, DimensionChoice, MetricChoice};
pub use query::{QueryState, Refresh, SortDir};
pub use schema::{Column, ColumnType};
pub use token::RequestTracker;

/// Identifier of an uploaded dataset, assigned by the backend.
pub type DatasetId = i64;
