use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter value resolved to the caller's tenant id at query time.
pub const CURRENT_TENANT_PLACEHOLDER: &str = "current-tenant";

/// Template form of [`CURRENT_TENANT_PLACEHOLDER`] produced by some authoring flows.
pub const TENANT_TEMPLATE_PLACEHOLDER: &str = "{tenant}";

pub fn is_tenant_placeholder(value: &str) -> bool {
    value == CURRENT_TENANT_PLACEHOLDER || value == TENANT_TEMPLATE_PLACEHOLDER
}

/// Declarative data source of a custom widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomWidgetDataConfig {
    /// Source name, checked against the backend source registry.
    pub table: String,
    /// Projection, e.g. `"name:status, value:count(*)"`. `None` selects every column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<DataFilter>,
    #[serde(default, alias = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl CustomWidgetDataConfig {
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: None,
            filters: Vec::new(),
            order_by: None,
            ascending: None,
            limit: None,
        }
    }
}

/// Single predicate of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFilter {
    pub column: String,
    #[serde(default)]
    pub operator: FilterOperator,
    pub value: Value,
}

impl DataFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }

    /// Filter value with tenant placeholders replaced by `tenant_id`.
    pub fn resolved_value(&self, tenant_id: &str) -> Value {
        match &self.value {
            Value::String(s) if is_tenant_placeholder(s) => Value::String(tenant_id.to_string()),
            other => other.clone(),
        }
    }
}

/// Predicate operator, named after the record store's filter vocabulary.
///
/// Operators the backend does not know deserialize into `Unsupported` so a
/// stored descriptor stays loadable; the query builder rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Is,
    #[serde(other)]
    Unsupported,
}
