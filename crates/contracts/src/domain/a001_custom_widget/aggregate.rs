use crate::shared::widgets::{
    custom_module_id, ChartType, CustomModuleFields, CustomWidgetDataConfig, DisplayConfig,
    WidgetType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomWidgetId(pub Uuid);

impl CustomWidgetId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
    pub fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(CustomWidgetId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A widget whose data and shape are described declaratively, typically
/// produced by an authoring flow rather than written in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomWidget {
    pub id: CustomWidgetId,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Request the widget was authored from, kept for re-generation.
    pub original_prompt: Option<String>,
    pub widget_type: WidgetType,
    pub chart_type: Option<ChartType>,
    pub data_config: CustomWidgetDataConfig,
    pub display_config: DisplayConfig,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update.
    pub version: i32,
}

impl CustomWidget {
    pub fn new_for_insert(
        tenant_id: String,
        name: String,
        widget_type: WidgetType,
        data_config: CustomWidgetDataConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CustomWidgetId::new_v4(),
            tenant_id,
            name,
            description: None,
            original_prompt: None,
            widget_type,
            chart_type: None,
            data_config,
            display_config: DisplayConfig::default(),
            enabled: true,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Id of the module that places this widget on the dashboard.
    pub fn module_id(&self) -> String {
        custom_module_id(&self.id.as_string())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".into());
        }
        if self.tenant_id.trim().is_empty() {
            return Err("Tenant must not be empty".into());
        }
        if self.data_config.table.trim().is_empty() {
            return Err("Data source table must not be empty".into());
        }
        if self.widget_type == WidgetType::Unknown {
            return Err("Unknown widget type".into());
        }
        if self.chart_type == Some(ChartType::Unknown) {
            return Err("Unknown chart type".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn to_module_fields(&self) -> CustomModuleFields {
        CustomModuleFields {
            custom_widget_id: self.id.as_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            original_prompt: self.original_prompt.clone(),
            widget_type: self.widget_type,
            chart_type: self.chart_type,
            data_config: self.data_config.clone(),
            display_config: self.display_config.clone(),
        }
    }
}
