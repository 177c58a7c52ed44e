use sea_orm::DbErr;
use thiserror::Error;

/// Failures of the module configuration store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Duplicate module id: {0}")]
    DuplicateModuleId(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Custom widget not found: {0}")]
    CustomWidgetNotFound(String),

    #[error("Invalid custom widget: {0}")]
    InvalidCustomWidget(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A custom widget descriptor the query builder refuses to execute
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryBuildError {
    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Column '{column}' is not available in source '{data_source}'")]
    ColumnNotAllowed { data_source: String, column: String },

    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Unsupported operator on column '{0}'")]
    UnsupportedOperator(String),

    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    #[error("Invalid value for column '{column}': {reason}")]
    InvalidFilterValue { column: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Record store query failed: {0}")]
    Query(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("Widget configuration error: {0}")]
    Configuration(#[from] QueryBuildError),

    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Failures of the dashboard operations exposed over HTTP
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Widget configuration error: {0}")]
    Configuration(#[from] QueryBuildError),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module '{0}' is not a custom widget")]
    NotCustom(String),
}
