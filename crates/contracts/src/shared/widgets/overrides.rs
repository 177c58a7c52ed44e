use serde::{Deserialize, Serialize};

/// Reporting period a widget aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temporality {
    #[default]
    Monthly,
    MonthlyCalendar,
    Quarterly,
    Yearly,
}

/// Per-module view settings, independent of enabled state and order.
///
/// An absent or empty filter means "all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfigOverride {
    #[serde(default)]
    pub temporality: Temporality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<Vec<String>>,
}

impl WidgetConfigOverride {
    pub fn matches_status(&self, status: &str) -> bool {
        matches_filter(self.status_filter.as_deref(), status)
    }

    pub fn matches_type(&self, case_type: &str) -> bool {
        matches_filter(self.type_filter.as_deref(), case_type)
    }
}

fn matches_filter(filter: Option<&[String]>, value: &str) -> bool {
    match filter {
        None => true,
        Some(values) if values.is_empty() => true,
        Some(values) => values.iter().any(|v| v == value),
    }
}
