use serde::{Deserialize, Serialize};

/// Category of a widget.
///
/// Views filter on it, and reconciliation uses it to decide which hidden
/// modules were excluded by the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetCategory {
    Dashboard,
    Advanced,
    Standard,
}

impl WidgetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetCategory::Dashboard => "dashboard",
            WidgetCategory::Advanced => "advanced",
            WidgetCategory::Standard => "standard",
        }
    }
}

/// Display footprint of a widget in the dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetSize {
    Small,
    Medium,
    Large,
    Full,
}

/// Static metadata describing one builtin widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    /// Stable key, also used as the module id.
    pub id: String,
    pub label: String,
    pub category: WidgetCategory,
    pub default_enabled: bool,
    pub default_size: WidgetSize,
    /// Order value assigned when the module is seeded for a tenant.
    pub default_position: i64,
}

impl WidgetDescriptor {
    /// Catalog entries are always builtin.
    pub fn is_custom(&self) -> bool {
        false
    }
}

/// Response of the catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetCatalogResponse {
    pub widgets: Vec<WidgetDescriptor>,
}
