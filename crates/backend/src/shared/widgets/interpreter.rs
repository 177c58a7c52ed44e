//! Custom widget interpreter
//!
//! Turns a declarative widget descriptor into rows (`resolve`), decides how
//! those rows are shown (`classify`), and shapes them for the client
//! (`present`). Configuration and store failures never escape as panics; the
//! caller gets [`RenderedWidget::Error`] instead.

use contracts::shared::widgets::{
    ChartPoint, ChartType, CustomModuleFields, CustomWidgetDataConfig, RenderMode,
    RenderedWidget, Row, WidgetType,
};
use once_cell::sync::OnceCell;
use serde_json::Value;

use super::error::{InterpreterError, QueryBuildError};
use super::query_builder::{build_query, BuiltQuery};
use super::record_store::RecordStore;
use super::source_registry::SourceRegistry;
use crate::shared::config::WidgetsConfig;

/// Row limits applied while resolving and presenting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterLimits {
    pub max_query_limit: u64,
    pub table_display_rows: usize,
}

impl Default for InterpreterLimits {
    fn default() -> Self {
        Self {
            max_query_limit: 1000,
            table_display_rows: 10,
        }
    }
}

impl From<&WidgetsConfig> for InterpreterLimits {
    fn from(config: &WidgetsConfig) -> Self {
        Self {
            max_query_limit: config.max_query_limit,
            table_display_rows: config.table_display_rows,
        }
    }
}

static LIMITS: OnceCell<InterpreterLimits> = OnceCell::new();

/// Install limits from the loaded configuration. Later calls are ignored.
pub fn init_limits(limits: InterpreterLimits) {
    if LIMITS.set(limits).is_err() {
        tracing::warn!("Interpreter limits already initialized");
    }
}

pub fn get_limits() -> InterpreterLimits {
    LIMITS.get().copied().unwrap_or_default()
}

/// Render mode for a widget shape. Total over every input.
pub fn classify(widget_type: WidgetType, chart_type: Option<ChartType>) -> RenderMode {
    match widget_type {
        WidgetType::Kpi => RenderMode::Indicator,
        WidgetType::Table => RenderMode::Table,
        WidgetType::Chart => match chart_type.unwrap_or(ChartType::Bar) {
            ChartType::Unknown => RenderMode::Unsupported,
            chart_type => RenderMode::Chart { chart_type },
        },
        WidgetType::Unknown => RenderMode::Unsupported,
    }
}

/// Shape resolved rows for display
pub fn present(rows: &[Row], mode: RenderMode, table_display_rows: usize) -> RenderedWidget {
    if mode == RenderMode::Unsupported {
        return RenderedWidget::Unsupported {
            reason: "Widget type is not supported".to_string(),
        };
    }
    if rows.is_empty() {
        return RenderedWidget::NoData;
    }

    match mode {
        RenderMode::Indicator => RenderedWidget::Indicator {
            value: indicator_value(rows),
        },
        // Rows without name/value degrade to a table
        RenderMode::Chart { chart_type } => match chart_points(rows) {
            Some(points) => RenderedWidget::Chart { chart_type, points },
            None => table(rows, table_display_rows),
        },
        RenderMode::Table => table(rows, table_display_rows),
        RenderMode::Unsupported => RenderedWidget::Unsupported {
            reason: "Widget type is not supported".to_string(),
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `rows[0].total` when numeric, otherwise the row count
fn indicator_value(rows: &[Row]) -> f64 {
    let row_count = rows.len() as f64;
    match rows.first().and_then(|row| row.get("total")) {
        // SUM/AVG over no matching rows
        Some(Value::Null) => 0.0,
        Some(total) => as_number(total).unwrap_or(row_count),
        None => row_count,
    }
}

fn point_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Every row must carry `name` and a numeric `value`. Row order is kept.
fn chart_points(rows: &[Row]) -> Option<Vec<ChartPoint>> {
    rows.iter()
        .map(|row| {
            Some(ChartPoint {
                name: row.get("name").and_then(point_name)?,
                value: row.get("value").and_then(as_number)?,
            })
        })
        .collect()
}

fn table(rows: &[Row], display_rows: usize) -> RenderedWidget {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    RenderedWidget::Table {
        columns,
        rows: rows.iter().take(display_rows).cloned().collect(),
        total_rows: rows.len(),
    }
}

/// Resolved and presented widget
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRender {
    pub render_mode: RenderMode,
    pub rows: Vec<Row>,
    pub rendered: RenderedWidget,
}

pub struct WidgetInterpreter<'a> {
    store: &'a dyn RecordStore,
    registry: &'a SourceRegistry,
    limits: InterpreterLimits,
}

impl<'a> WidgetInterpreter<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        registry: &'a SourceRegistry,
        limits: InterpreterLimits,
    ) -> Self {
        Self {
            store,
            registry,
            limits,
        }
    }

    /// Check that a descriptor can be executed without running it
    pub fn validate(
        &self,
        config: &CustomWidgetDataConfig,
        tenant_id: &str,
    ) -> Result<BuiltQuery, QueryBuildError> {
        build_query(self.registry, config, tenant_id, self.limits.max_query_limit)
    }

    /// Execute the descriptor, scoped to `tenant_id`
    pub async fn resolve(
        &self,
        config: &CustomWidgetDataConfig,
        tenant_id: &str,
    ) -> Result<Vec<Row>, InterpreterError> {
        let query = self.validate(config, tenant_id)?;
        let rows = self.store.fetch(&query).await?;
        Ok(rows)
    }

    pub fn present(&self, rows: &[Row], mode: RenderMode) -> RenderedWidget {
        present(rows, mode, self.limits.table_display_rows)
    }

    /// Resolve and present a custom module
    pub async fn render(&self, fields: &CustomModuleFields, tenant_id: &str) -> WidgetRender {
        let render_mode = classify(fields.widget_type, fields.chart_type);

        if render_mode == RenderMode::Unsupported {
            return WidgetRender {
                render_mode,
                rows: Vec::new(),
                rendered: self.present(&[], render_mode),
            };
        }

        match self.resolve(&fields.data_config, tenant_id).await {
            Ok(rows) => {
                let rendered = self.present(&rows, render_mode);
                if matches!(render_mode, RenderMode::Chart { .. })
                    && matches!(rendered, RenderedWidget::Table { .. })
                {
                    tracing::warn!(
                        "Custom widget {} of tenant {}: rows lack name/value, rendered as table",
                        fields.custom_widget_id,
                        tenant_id
                    );
                }
                WidgetRender {
                    render_mode,
                    rows,
                    rendered,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to resolve custom widget {} for tenant {}: {}",
                    fields.custom_widget_id,
                    tenant_id,
                    e
                );
                WidgetRender {
                    render_mode,
                    rows: Vec::new(),
                    rendered: RenderedWidget::Error {
                        message: e.to_string(),
                    },
                }
            }
        }
    }
}
