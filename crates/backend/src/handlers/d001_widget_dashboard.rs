use axum::{extract::Path, http::StatusCode, Json};
use contracts::shared::widgets::{
    Module, ModuleWriteResponse, RenderDataResponse, ReorderRequest, ToggleRequest,
    WidgetCatalogResponse, WidgetConfigOverride,
};

use crate::dashboards::d001_widget_dashboard::service::DashboardService;
use crate::shared::data::db::get_connection;
use crate::shared::widgets::catalog::get_catalog;
use crate::shared::widgets::error::{DashboardError, StoreError};
use crate::shared::widgets::record_store::SqliteRecordStore;
use crate::system::tenant::extractor::TenantContext;

type WriteResult = Result<Json<ModuleWriteResponse>, (StatusCode, Json<ModuleWriteResponse>)>;

fn records() -> SqliteRecordStore {
    SqliteRecordStore::new(get_connection().clone())
}

fn store_error_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::ModuleNotFound(_) | StoreError::CustomWidgetNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        StoreError::DuplicateModuleId(_) | StoreError::InvalidCustomWidget(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoreError::Db(_) | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failed write: report it together with the last known-good list
async fn rejected_write(
    service: &DashboardService<'_>,
    tenant_id: &str,
    error: StoreError,
) -> (StatusCode, Json<ModuleWriteResponse>) {
    tracing::error!("Module write failed for tenant {}: {}", tenant_id, error);
    let modules = service.get_modules(tenant_id).await;
    (
        store_error_status(&error),
        Json(ModuleWriteResponse {
            applied: false,
            message: Some(error.to_string()),
            modules,
        }),
    )
}

/// GET /api/dashboard/catalog
pub async fn get_catalog_widgets() -> Json<WidgetCatalogResponse> {
    Json(get_catalog().to_response())
}

/// GET /api/dashboard/modules
pub async fn list_modules(TenantContext(tenant_id): TenantContext) -> Json<Vec<Module>> {
    let records = records();
    let service = DashboardService::from_globals(&records);
    Json(service.get_modules(&tenant_id).await)
}

/// POST /api/dashboard/modules/reorder
pub async fn reorder_modules(
    TenantContext(tenant_id): TenantContext,
    Json(request): Json<ReorderRequest>,
) -> WriteResult {
    let records = records();
    let service = DashboardService::from_globals(&records);

    match service.on_reorder(&tenant_id, &request).await {
        Ok(modules) => Ok(Json(ModuleWriteResponse {
            applied: true,
            message: None,
            modules,
        })),
        Err(e) => Err(rejected_write(&service, &tenant_id, e).await),
    }
}

/// POST /api/dashboard/modules/:id/toggle
pub async fn toggle_module(
    TenantContext(tenant_id): TenantContext,
    Path(module_id): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> WriteResult {
    let records = records();
    let service = DashboardService::from_globals(&records);

    match service
        .on_toggle(&tenant_id, &module_id, request.enabled)
        .await
    {
        Ok(modules) => Ok(Json(ModuleWriteResponse {
            applied: true,
            message: None,
            modules,
        })),
        Err(e) => Err(rejected_write(&service, &tenant_id, e).await),
    }
}

/// GET /api/dashboard/modules/:id/data
pub async fn get_module_data(
    TenantContext(tenant_id): TenantContext,
    Path(module_id): Path<String>,
) -> Result<Json<RenderDataResponse>, StatusCode> {
    let records = records();
    let service = DashboardService::from_globals(&records);

    match service.render_data_for(&tenant_id, &module_id).await {
        Ok(response) => Ok(Json(response)),
        Err(DashboardError::ModuleNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(DashboardError::NotCustom(_)) => Err(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::error!("Failed to render module {}: {}", module_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/dashboard/modules/:id/override
pub async fn get_module_override(
    TenantContext(tenant_id): TenantContext,
    Path(module_id): Path<String>,
) -> Json<Option<WidgetConfigOverride>> {
    let records = records();
    let service = DashboardService::from_globals(&records);
    Json(service.get_override(&tenant_id, &module_id).await)
}

/// PUT /api/dashboard/modules/:id/override
pub async fn set_module_override(
    TenantContext(tenant_id): TenantContext,
    Path(module_id): Path<String>,
    Json(config): Json<WidgetConfigOverride>,
) -> Result<Json<WidgetConfigOverride>, StatusCode> {
    let records = records();
    let service = DashboardService::from_globals(&records);

    match service.set_override(&tenant_id, &module_id, &config).await {
        Ok(()) => Ok(Json(config)),
        Err(e) => {
            tracing::error!("Failed to save override of {}: {}", module_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
