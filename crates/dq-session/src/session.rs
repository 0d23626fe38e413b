//! The dashboard session: one open dataset and its derived views
//!
//! All interaction happens on the session: a transition mutates the query
//! state synchronously, then the session issues the remote fetches that
//! state change invalidated. Responses are applied under two independent
//! guards: a per-kind request token (last request wins) and the dataset
//! generation (a dataset switch invalidates everything in flight).

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use dq_client::{AggregateRequest, ApiError, DataBackend, MetricSpec, RowPage};
use dq_core::{ChartQuery, ChartSeries, Column, DatasetId, QueryState, Refresh, RequestTracker};

use crate::export::{ExportError, FileSaver};

/// Snapshot of the table panel for rendering.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    /// The latest applied row page, if any fetch has succeeded.
    pub page: Option<RowPage>,
    /// Error from the latest applied fetch, shown in place of rows.
    pub error: Option<String>,
    /// True from request issue until a non-discarded response or error.
    pub loading: bool,
}

#[derive(Default)]
struct TablePanel {
    page: Option<RowPage>,
    error: Option<String>,
    tracker: RequestTracker,
}

#[derive(Default)]
struct ChartPanel {
    series: Option<ChartSeries>,
    tracker: RequestTracker,
}

#[derive(Default)]
struct ColumnsPanel {
    columns: Vec<Column>,
    loaded: bool,
    error: Option<String>,
    tracker: RequestTracker,
}

#[derive(Default)]
struct SessionState {
    dataset: Option<DatasetId>,
    /// Bumped on every dataset switch; responses from an older generation
    /// are discarded unconditionally.
    generation: u64,
    /// Set when the backend reports the dataset gone; no further queries
    /// are issued for it.
    missing: bool,
    query: QueryState,
    columns: ColumnsPanel,
    table: TablePanel,
    chart: ChartPanel,
}

/// A request's identity, checked at response-apply time.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    token: u64,
}

/// Orchestrates queries for one dashboard view over a [`DataBackend`].
///
/// Cheap to clone; clones share the same session state.
pub struct Dashboard<B> {
    backend: Arc<B>,
    state: Arc<RwLock<SessionState>>,
}

impl<B> Clone for Dashboard<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
        }
    }
}

impl<B: DataBackend> Dashboard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    /// Activate a dataset, resetting the query state and all derived views.
    ///
    /// Any fetch still in flight for the previous dataset is invalidated by
    /// the generation bump, even if it would otherwise be the latest
    /// request of its kind.
    pub async fn open_dataset(&self, id: DatasetId) {
        {
            let mut state = self.state.write();
            state.generation += 1;
            state.dataset = Some(id);
            state.missing = false;
            state.query = QueryState::default();
            state.columns = ColumnsPanel::default();
            state.table = TablePanel::default();
            state.chart = ChartPanel::default();
            info!(dataset = id, "opening dataset");
        }
        // Columns and the first row page load independently: the table can
        // render without type metadata. The chart follows the columns.
        tokio::join!(self.load_columns(), self.fetch_rows());
    }

    /// Jump to a page of the current result set.
    pub async fn set_page(&self, page: u32) {
        self.apply_transition(|query| query.set_page(page)).await;
    }

    /// Change the page size, returning to page 1.
    pub async fn set_page_size(&self, page_size: u32) {
        self.apply_transition(|query| query.set_page_size(page_size)).await;
    }

    /// Sort by a column, flipping direction on a repeated column.
    pub async fn set_sort(&self, column: &str) {
        self.apply_transition(|query| query.set_sort(column)).await;
    }

    /// Set or clear a per-column filter.
    pub async fn set_filter(&self, column: &str, value: &str) {
        self.apply_transition(|query| query.set_filter(column, value)).await;
    }

    /// Replace the global search term.
    pub async fn set_search(&self, text: &str) {
        self.apply_transition(|query| query.set_search(text)).await;
    }

    /// Export the full filtered/searched dataset as CSV.
    ///
    /// The byte stream is handed unmodified to `saver` under the name
    /// `export_<dataset>.csv`; nothing is saved when the request fails.
    pub async fn export_csv(&self, saver: &dyn FileSaver) -> Result<String, ExportError> {
        let (id, query) = {
            let state = self.state.read();
            let id = state.dataset.ok_or(ExportError::NoDataset)?;
            if state.missing {
                return Err(ExportError::Request(ApiError::NotFound(
                    "dataset no longer exists".to_owned(),
                )));
            }
            (id, state.query.clone())
        };

        let contents = self.backend.export_csv(id, &query).await?;
        let filename = format!("export_{id}.csv");
        saver.save(&filename, contents).await.map_err(ExportError::Save)?;
        info!(dataset = id, filename = %filename, "export saved");
        Ok(filename)
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub fn dataset(&self) -> Option<DatasetId> {
        self.state.read().dataset
    }

    /// True when the backend reported the active dataset deleted.
    pub fn dataset_missing(&self) -> bool {
        self.state.read().missing
    }

    pub fn query(&self) -> QueryState {
        self.state.read().query.clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.state.read().columns.columns.clone()
    }

    pub fn columns_error(&self) -> Option<String> {
        self.state.read().columns.error.clone()
    }

    pub fn table(&self) -> TableView {
        let state = self.state.read();
        TableView {
            page: state.table.page.clone(),
            error: state.table.error.clone(),
            loading: state.table.tracker.in_flight(),
        }
    }

    pub fn chart(&self) -> Option<ChartSeries> {
        self.state.read().chart.series.clone()
    }

    /// Mutate the query state, then run the fetches it invalidated.
    async fn apply_transition(&self, transition: impl FnOnce(&mut QueryState) -> Refresh) {
        let refresh = {
            let mut state = self.state.write();
            if state.dataset.is_none() {
                return;
            }
            transition(&mut state.query)
        };

        if refresh.chart {
            tokio::join!(self.fetch_rows(), self.fetch_chart());
        } else if refresh.rows {
            self.fetch_rows().await;
        }
    }

    async fn fetch_rows(&self) {
        let issued = {
            let mut state = self.state.write();
            match state.dataset {
                Some(id) if !state.missing => {
                    let token = state.table.tracker.issue();
                    Some((Ticket { generation: state.generation, token }, id, state.query.clone()))
                }
                _ => None,
            }
        };
        let Some((ticket, id, query)) = issued else { return };

        let result = self.backend.rows(id, &query).await;

        let mut state = self.state.write();
        if state.generation != ticket.generation || !state.table.tracker.try_apply(ticket.token) {
            debug!(dataset = id, token = ticket.token, "discarding stale row page");
            return;
        }
        match result {
            Ok(page) => {
                state.table.page = Some(page);
                state.table.error = None;
            }
            Err(ApiError::NotFound(_)) => {
                state.missing = true;
                state.table.page = None;
                state.table.error = Some("dataset no longer exists".to_owned());
            }
            Err(e) => {
                state.table.error = Some(e.to_string());
            }
        }
    }

    /// Load column metadata once per dataset activation, then derive the
    /// chart. Failure is recorded but never blocks row browsing.
    async fn load_columns(&self) {
        let issued = {
            let mut state = self.state.write();
            match state.dataset {
                Some(id) if !state.missing => {
                    let token = state.columns.tracker.issue();
                    Some((Ticket { generation: state.generation, token }, id))
                }
                _ => None,
            }
        };
        let Some((ticket, id)) = issued else { return };

        let result = self.backend.columns(id).await;

        {
            let mut state = self.state.write();
            if state.generation != ticket.generation
                || !state.columns.tracker.try_apply(ticket.token)
            {
                debug!(dataset = id, "discarding stale column list");
                return;
            }
            match result {
                Ok(columns) => {
                    state.columns.columns = columns;
                    state.columns.loaded = true;
                    state.columns.error = None;
                }
                Err(ApiError::NotFound(_)) => {
                    state.missing = true;
                    state.columns.error = Some("dataset no longer exists".to_owned());
                    return;
                }
                Err(e) => {
                    warn!(dataset = id, error = %e, "column metadata load failed");
                    state.columns.error = Some(e.to_string());
                    return;
                }
            }
        }

        self.fetch_chart().await;
    }

    /// Re-derive and fetch the chart aggregation.
    ///
    /// Skipped until column metadata is available or when the dataset has
    /// no columns. Errors are swallowed: the chart keeps its previous
    /// series and the table stays usable.
    async fn fetch_chart(&self) {
        let issued = {
            let mut state = self.state.write();
            match state.dataset {
                Some(id) if !state.missing && state.columns.loaded => {
                    ChartQuery::derive(&state.columns.columns).map(|chart_query| {
                        let token = state.chart.tracker.issue();
                        let request = AggregateRequest {
                            group_by: vec![chart_query.dimension_column().to_owned()],
                            metrics: vec![MetricSpec {
                                col: chart_query.aggregate_column().to_owned(),
                                agg: chart_query.aggregate_op().to_owned(),
                            }],
                            filters: state.query.filters().clone(),
                            search: if state.query.search().is_empty() {
                                None
                            } else {
                                Some(state.query.search().to_owned())
                            },
                        };
                        (Ticket { generation: state.generation, token }, id, chart_query, request)
                    })
                }
                _ => None,
            }
        };
        let Some((ticket, id, chart_query, request)) = issued else { return };

        let result = self.backend.aggregate(id, &request).await;

        let mut state = self.state.write();
        if state.generation != ticket.generation || !state.chart.tracker.try_apply(ticket.token) {
            debug!(dataset = id, token = ticket.token, "discarding stale aggregation");
            return;
        }
        match result {
            Ok(response) => {
                state.chart.series = Some(chart_query.map_response(&response.data));
            }
            Err(e) => {
                warn!(dataset = id, error = %e, "aggregation failed, keeping previous chart");
            }
        }
    }
}
