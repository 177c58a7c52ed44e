use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;

/// All application routes
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // DASHBOARD MODULES
        // ========================================
        .route(
            "/api/dashboard/catalog",
            get(handlers::d001_widget_dashboard::get_catalog_widgets),
        )
        .route(
            "/api/dashboard/modules",
            get(handlers::d001_widget_dashboard::list_modules),
        )
        .route(
            "/api/dashboard/modules/reorder",
            post(handlers::d001_widget_dashboard::reorder_modules),
        )
        .route(
            "/api/dashboard/modules/:id/toggle",
            post(handlers::d001_widget_dashboard::toggle_module),
        )
        .route(
            "/api/dashboard/modules/:id/data",
            get(handlers::d001_widget_dashboard::get_module_data),
        )
        .route(
            "/api/dashboard/modules/:id/override",
            get(handlers::d001_widget_dashboard::get_module_override)
                .put(handlers::d001_widget_dashboard::set_module_override),
        )
        // ========================================
        // CUSTOM WIDGETS
        // ========================================
        .route(
            "/api/custom-widgets",
            get(handlers::a001_custom_widget::list_all).post(handlers::a001_custom_widget::upsert),
        )
        .route(
            "/api/custom-widgets/:id",
            delete(handlers::a001_custom_widget::delete),
        )
}
