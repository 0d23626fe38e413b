//! Deriving the dashboard chart from column metadata
//!
//! The chart always shows exactly one aggregation: one group-by dimension
//! and at most one metric. Which one is a deterministic function of the
//! column list, written out as tagged variants so the edge cases (no
//! columns, no numeric column) stay explicit.

use serde_json::{Map, Value};

use crate::schema::{Column, ColumnType};

/// The group-by column picked for the chart, tagged by why it was picked.
///
/// Priority: first string column, else first date column, else the first
/// column of the dataset whatever its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionChoice {
    Text(String),
    Date(String),
    FirstColumn(String),
}

impl DimensionChoice {
    pub fn column(&self) -> &str {
        match self {
            DimensionChoice::Text(name)
            | DimensionChoice::Date(name)
            | DimensionChoice::FirstColumn(name) => name,
        }
    }
}

/// The metric aggregated per dimension value.
///
/// The first numeric column (other than the dimension itself) is summed;
/// without a numeric column the chart falls back to counting rows per
/// dimension value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricChoice {
    Sum(String),
    Count,
}

/// The single aggregation the chart needs for the current column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    pub dimension: DimensionChoice,
    pub metric: MetricChoice,
}

impl ChartQuery {
    /// Derive the chart query from the dataset's columns.
    ///
    /// Returns `None` when the dataset has no columns at all; no chart is
    /// requested in that case.
    pub fn derive(columns: &[Column]) -> Option<Self> {
        let dimension = columns
            .iter()
            .find(|c| c.ty == ColumnType::String)
            .map(|c| DimensionChoice::Text(c.name.clone()))
            .or_else(|| {
                columns
                    .iter()
                    .find(|c| c.ty == ColumnType::Date)
                    .map(|c| DimensionChoice::Date(c.name.clone()))
            })
            .or_else(|| columns.first().map(|c| DimensionChoice::FirstColumn(c.name.clone())))?;

        let metric = columns
            .iter()
            .find(|c| c.ty == ColumnType::Number && c.name != dimension.column())
            .map(|c| MetricChoice::Sum(c.name.clone()))
            .unwrap_or(MetricChoice::Count);

        Some(Self { dimension, metric })
    }

    pub fn dimension_column(&self) -> &str {
        self.dimension.column()
    }

    /// The summed column, if the chart has a numeric metric.
    pub fn metric_column(&self) -> Option<&str> {
        match &self.metric {
            MetricChoice::Sum(name) => Some(name),
            MetricChoice::Count => None,
        }
    }

    /// The column named in the aggregation request's metric entry.
    ///
    /// The count fallback counts the dimension column itself.
    pub fn aggregate_column(&self) -> &str {
        match &self.metric {
            MetricChoice::Sum(name) => name,
            MetricChoice::Count => self.dimension.column(),
        }
    }

    pub fn aggregate_op(&self) -> &'static str {
        match &self.metric {
            MetricChoice::Sum(_) => "sum",
            MetricChoice::Count => "count",
        }
    }

    /// Key under which the backend reports the aggregated value,
    /// `<col>_<agg>`.
    pub fn value_key(&self) -> String {
        format!("{}_{}", self.aggregate_column(), self.aggregate_op())
    }

    /// Human-readable label for the chart series.
    pub fn series_label(&self) -> String {
        match &self.metric {
            MetricChoice::Sum(name) => format!("Sum of {name}"),
            MetricChoice::Count => format!("Count by {}", self.dimension.column()),
        }
    }

    /// Map an aggregation response into a chart-ready series.
    ///
    /// Every record contributes one label/value pair. A record missing the
    /// value key yields `0.0` rather than being dropped, keeping the label
    /// and value sequences aligned.
    pub fn map_response(&self, data: &[Map<String, Value>]) -> ChartSeries {
        let value_key = self.value_key();
        let labels = data
            .iter()
            .map(|record| record.get(self.dimension_column()).cloned().unwrap_or(Value::Null))
            .collect();
        let values = data
            .iter()
            .map(|record| record.get(&value_key).and_then(Value::as_f64).unwrap_or(0.0))
            .collect();

        ChartSeries {
            labels,
            values,
            dimension_column: self.dimension_column().to_owned(),
            metric_column: self.metric_column().map(str::to_owned),
            series_label: self.series_label(),
        }
    }
}

/// Chart-ready data derived from one aggregation response.
///
/// `labels` and `values` always have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<Value>,
    pub values: Vec<f64>,
    pub dimension_column: String,
    pub metric_column: Option<String>,
    pub series_label: String,
}
