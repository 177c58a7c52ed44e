//! Data sources custom widgets may query
//!
//! The allow-list the query builder checks every descriptor against: known
//! sources, the columns they expose, and the column that scopes a row to a
//! tenant.

use std::collections::HashMap;

/// Type of a source column, used to coerce filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Numeric,
    Date,
}

#[derive(Debug, Clone)]
pub struct SourceColumn {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn col(name: &'static str, column_type: ColumnType) -> SourceColumn {
    SourceColumn { name, column_type }
}

/// A queryable record collection
#[derive(Debug, Clone)]
pub struct DataSource {
    /// Name used in descriptors (`data_config.table`)
    pub id: &'static str,
    /// Actual database table
    pub table_name: &'static str,
    /// Rows are always restricted to the caller's tenant through this column
    pub tenant_column: Option<&'static str>,
    pub columns: &'static [SourceColumn],
}

impl DataSource {
    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub static CASES: DataSource = DataSource {
    id: "cases",
    table_name: "cases",
    tenant_column: Some("tenant_id"),
    columns: &[
        col("id", ColumnType::Text),
        col("tenant_id", ColumnType::Text),
        col("case_number", ColumnType::Text),
        col("status", ColumnType::Text),
        col("case_type", ColumnType::Text),
        col("customer_id", ColumnType::Text),
        col("device", ColumnType::Text),
        col("technician", ColumnType::Text),
        col("total", ColumnType::Numeric),
        col("created_at", ColumnType::Date),
        col("closed_at", ColumnType::Date),
    ],
};

pub static CUSTOMERS: DataSource = DataSource {
    id: "customers",
    table_name: "customers",
    tenant_column: Some("tenant_id"),
    columns: &[
        col("id", ColumnType::Text),
        col("tenant_id", ColumnType::Text),
        col("name", ColumnType::Text),
        col("email", ColumnType::Text),
        col("phone", ColumnType::Text),
        col("created_at", ColumnType::Date),
    ],
};

pub static INVOICES: DataSource = DataSource {
    id: "invoices",
    table_name: "invoices",
    tenant_column: Some("tenant_id"),
    columns: &[
        col("id", ColumnType::Text),
        col("tenant_id", ColumnType::Text),
        col("case_id", ColumnType::Text),
        col("invoice_number", ColumnType::Text),
        col("status", ColumnType::Text),
        col("amount", ColumnType::Numeric),
        col("issued_at", ColumnType::Date),
        col("paid_at", ColumnType::Date),
    ],
};

pub static PARTS: DataSource = DataSource {
    id: "parts",
    table_name: "parts",
    tenant_column: Some("tenant_id"),
    columns: &[
        col("id", ColumnType::Text),
        col("tenant_id", ColumnType::Text),
        col("sku", ColumnType::Text),
        col("name", ColumnType::Text),
        col("category", ColumnType::Text),
        col("quantity", ColumnType::Integer),
        col("unit_cost", ColumnType::Numeric),
    ],
};

/// Registry of sources available to custom widgets
pub struct SourceRegistry {
    sources: HashMap<String, &'static DataSource>,
}

impl SourceRegistry {
    /// Registry with every source of the repair shop record store
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(&CASES);
        registry.register(&CUSTOMERS);
        registry.register(&INVOICES);
        registry.register(&PARTS);
        registry
    }

    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn register(&mut self, source: &'static DataSource) {
        self.sources.insert(source.id.to_string(), source);
    }

    pub fn get(&self, id: &str) -> Option<&'static DataSource> {
        self.sources.get(id).copied()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// Source ids, sorted
    pub fn list_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.sources.values().map(|s| s.id).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<SourceRegistry> = std::sync::OnceLock::new();

/// Get global source registry
pub fn get_registry() -> &'static SourceRegistry {
    REGISTRY.get_or_init(SourceRegistry::new)
}
