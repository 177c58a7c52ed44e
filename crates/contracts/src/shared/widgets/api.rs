use serde::{Deserialize, Serialize};

use super::data_config::CustomWidgetDataConfig;
use super::display::DisplayConfig;
use super::module::{Module, ModuleView};
use super::render::{ChartType, WidgetType};

/// Drag result on one view: the item at `from_index` of `visible_ids` was
/// dropped at `to_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub view: ModuleView,
    pub visible_ids: Vec<String>,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Outcome of a module write.
///
/// When `applied` is false, `modules` is the last known-good list the
/// client should roll back to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleWriteResponse {
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub modules: Vec<Module>,
}

/// Create (no `id`) or update a custom widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertCustomWidgetRequest {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub original_prompt: Option<String>,
    pub widget_type: WidgetType,
    #[serde(default)]
    pub chart_type: Option<ChartType>,
    pub data_config: CustomWidgetDataConfig,
    #[serde(default)]
    pub display_config: DisplayConfig,
    #[serde(default)]
    pub enabled: Option<bool>,
}
