use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a001_custom_widget::aggregate::CustomWidget;
use contracts::shared::widgets::UpsertCustomWidgetRequest;
use serde_json::json;

use crate::dashboards::d001_widget_dashboard::service::DashboardService;
use crate::shared::data::db::get_connection;
use crate::shared::widgets::error::{DashboardError, StoreError};
use crate::shared::widgets::record_store::SqliteRecordStore;
use crate::system::tenant::extractor::TenantContext;

/// GET /api/custom-widgets
pub async fn list_all(
    TenantContext(tenant_id): TenantContext,
) -> Result<Json<Vec<CustomWidget>>, StatusCode> {
    let records = SqliteRecordStore::new(get_connection().clone());
    let service = DashboardService::from_globals(&records);

    match service.list_custom_widgets(&tenant_id).await {
        Ok(widgets) => Ok(Json(widgets)),
        Err(e) => {
            tracing::error!("Failed to list custom widgets: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/custom-widgets
///
/// Creates the widget when `id` is absent, updates it otherwise.
pub async fn upsert(
    TenantContext(tenant_id): TenantContext,
    Json(request): Json<UpsertCustomWidgetRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let records = SqliteRecordStore::new(get_connection().clone());
    let service = DashboardService::from_globals(&records);

    match service.save_custom_widget(&tenant_id, request).await {
        Ok((widget, module)) => Ok(Json(json!({
            "success": true,
            "widget": widget,
            "module": module,
        }))),
        Err(e) => {
            let status = match &e {
                DashboardError::Configuration(_)
                | DashboardError::Store(StoreError::InvalidCustomWidget(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DashboardError::Store(StoreError::CustomWidgetNotFound(_)) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("Failed to save custom widget: {}", e);
            } else {
                tracing::warn!("Rejected custom widget: {}", e);
            }
            Err((
                status,
                Json(json!({"success": false, "error": e.to_string()})),
            ))
        }
    }
}

/// DELETE /api/custom-widgets/:id
pub async fn delete(
    TenantContext(tenant_id): TenantContext,
    Path(id): Path<String>,
) -> StatusCode {
    let records = SqliteRecordStore::new(get_connection().clone());
    let service = DashboardService::from_globals(&records);

    match service.delete_custom_widget(&tenant_id, &id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(StoreError::CustomWidgetNotFound(_)) => StatusCode::NOT_FOUND,
        Err(e) => {
            tracing::error!("Failed to delete custom widget {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
