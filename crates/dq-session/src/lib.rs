//! Query orchestration for the data dashboard
//!
//! This crate turns user interactions (paging, sorting, filtering,
//! searching) into the minimal sequence of backend queries and keeps the
//! table, the chart, and CSV export consistent with the same query state.

pub mod debounce;
pub mod export;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use debounce::Debouncer;
pub use export::{DiskSaver, ExportError, FileSaver};
pub use session::{Dashboard, TableView};
