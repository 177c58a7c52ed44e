use serde::{Deserialize, Serialize};

use super::catalog::WidgetCategory;
use super::data_config::CustomWidgetDataConfig;
use super::display::DisplayConfig;
use super::render::{ChartType, WidgetType};

/// Prefix of module ids that belong to custom widgets.
pub const CUSTOM_MODULE_PREFIX: &str = "custom_";

/// Module id of a custom widget.
pub fn custom_module_id(custom_widget_id: &str) -> String {
    format!("{}{}", CUSTOM_MODULE_PREFIX, custom_widget_id)
}

/// A tenant-scoped widget slot: a builtin or custom widget together with
/// its enabled state and relative display order.
///
/// `order` only ranks modules against each other. It is not an index and is
/// not guaranteed to be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub enabled: bool,
    pub order: i64,
    /// Present exactly when the module belongs to a custom widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomModuleFields>,
}

impl Module {
    pub fn builtin(id: impl Into<String>, enabled: bool, order: i64) -> Self {
        Self {
            id: id.into(),
            enabled,
            order,
            custom: None,
        }
    }

    pub fn custom(fields: CustomModuleFields, enabled: bool, order: i64) -> Self {
        Self {
            id: custom_module_id(&fields.custom_widget_id),
            enabled,
            order,
            custom: Some(fields),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }
}

/// Custom widget definition carried by its module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomModuleFields {
    pub custom_widget_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
    pub widget_type: WidgetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    pub data_config: CustomWidgetDataConfig,
    #[serde(default)]
    pub display_config: DisplayConfig,
}

/// One filtered projection of the module list, e.g. what a single
/// drag-and-drop surface shows.
///
/// A module is visible when it is enabled and its category is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleView {
    pub categories: Vec<WidgetCategory>,
}

impl ModuleView {
    /// The main dashboard: everything except advanced reports.
    pub fn dashboard() -> Self {
        Self {
            categories: vec![WidgetCategory::Dashboard, WidgetCategory::Standard],
        }
    }

    pub fn advanced() -> Self {
        Self {
            categories: vec![WidgetCategory::Advanced],
        }
    }

    pub fn includes(&self, category: WidgetCategory) -> bool {
        self.categories.contains(&category)
    }
}

impl Default for ModuleView {
    fn default() -> Self {
        Self::dashboard()
    }
}
