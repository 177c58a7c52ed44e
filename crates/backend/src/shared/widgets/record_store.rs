use async_trait::async_trait;
use contracts::shared::widgets::Row;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult, Statement};
use serde_json::Value;

use super::error::RecordStoreError;
use super::query_builder::BuiltQuery;

/// Executes built queries against the tenant record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch(&self, query: &BuiltQuery) -> Result<Vec<Row>, RecordStoreError>;
}

/// Record store backed by the application SQLite database
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: DatabaseConnection,
}

impl SqliteRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Read one result column by its runtime type. Aggregates carry no declared
/// type, so integer, real and text are tried in turn.
fn column_value(result: &QueryResult, column: &str) -> Value {
    if let Ok(value) = result.try_get::<Option<i64>>("", column) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = result.try_get::<Option<f64>>("", column) {
        return value
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    result
        .try_get::<Option<String>>("", column)
        .ok()
        .flatten()
        .map(Value::String)
        .unwrap_or(Value::Null)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch(&self, query: &BuiltQuery) -> Result<Vec<Row>, RecordStoreError> {
        let values: Vec<sea_orm::Value> = query.params.iter().map(sea_orm::Value::from).collect();
        let statement = Statement::from_sql_and_values(DatabaseBackend::Sqlite, &query.sql, values);

        tracing::debug!("Record store query: {}", query.sql);

        let results = self.db.query_all(statement).await?;

        Ok(results
            .iter()
            .map(|result| {
                query
                    .columns
                    .iter()
                    .map(|column| (column.clone(), column_value(result, column)))
                    .collect()
            })
            .collect())
    }
}
