use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record returned by the record store.
pub type Row = Map<String, Value>;

/// Shape of a custom widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Kpi,
    Chart,
    Table,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Area,
    #[serde(other)]
    Unknown,
}

impl ChartType {
    /// Line, bar and area charts plot rows along an ordered `name` axis.
    pub fn has_ordered_axis(&self) -> bool {
        matches!(self, ChartType::Line | ChartType::Bar | ChartType::Area)
    }
}

/// How resolved rows are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderMode {
    Indicator,
    Chart { chart_type: ChartType },
    Table,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Rows shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedWidget {
    /// Empty result set. Clients show an explicit "no data" state.
    NoData,
    Indicator {
        value: f64,
    },
    Chart {
        chart_type: ChartType,
        points: Vec<ChartPoint>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Row>,
        /// Rows returned by the query, before the display cap.
        total_rows: usize,
    },
    Unsupported {
        reason: String,
    },
    /// The descriptor could not be executed.
    Error {
        message: String,
    },
}

/// Payload of `renderDataFor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDataResponse {
    pub module_id: String,
    /// Version of the custom widget the rows were resolved for.
    pub widget_version: i32,
    pub render_mode: RenderMode,
    pub rows: Vec<Row>,
    pub rendered: RenderedWidget,
}
