use contracts::domain::a001_custom_widget::aggregate::CustomWidget;
use contracts::shared::widgets::{
    Module, RenderDataResponse, ReorderRequest, UpsertCustomWidgetRequest, WidgetConfigOverride,
};
use sea_orm::DatabaseConnection;

use crate::domain::a002_dashboard_module::service::ModuleStore;
use crate::domain::a003_widget_override::repository as override_repository;
use crate::shared::data::db::get_connection;
use crate::shared::widgets::catalog::{get_catalog, WidgetCatalog};
use crate::shared::widgets::error::{DashboardError, StoreError};
use crate::shared::widgets::interpreter::{get_limits, WidgetInterpreter};
use crate::shared::widgets::reconcile;
use crate::shared::widgets::record_store::RecordStore;
use crate::shared::widgets::source_registry::get_registry;

/// Dashboard operations for one request: module list, drag reorder, toggles,
/// custom widget data and per-module overrides
pub struct DashboardService<'a> {
    db: &'a DatabaseConnection,
    catalog: &'a WidgetCatalog,
    interpreter: WidgetInterpreter<'a>,
}

impl<'a> DashboardService<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        catalog: &'a WidgetCatalog,
        interpreter: WidgetInterpreter<'a>,
    ) -> Self {
        Self {
            db,
            catalog,
            interpreter,
        }
    }

    /// Service over the global connection, catalog and source registry
    pub fn from_globals(records: &'a dyn RecordStore) -> Self {
        let interpreter = WidgetInterpreter::new(records, get_registry(), get_limits());
        Self::new(get_connection(), get_catalog(), interpreter)
    }

    fn store(&self) -> ModuleStore<'a> {
        ModuleStore::new(self.db, self.catalog)
    }

    /// Module list for rendering. Never fails: an unreadable store yields the
    /// catalog defaults.
    pub async fn get_modules(&self, tenant_id: &str) -> Vec<Module> {
        match self.store().list(tenant_id).await {
            Ok(modules) => modules,
            Err(e) => {
                tracing::warn!(
                    "Failed to load modules for tenant {}, using catalog defaults: {}",
                    tenant_id,
                    e
                );
                self.catalog.default_modules()
            }
        }
    }

    /// Apply a drag on one view and persist the reconciled full list.
    ///
    /// A no-op drag writes nothing and returns the current list.
    pub async fn on_reorder(
        &self,
        tenant_id: &str,
        request: &ReorderRequest,
    ) -> Result<Vec<Module>, StoreError> {
        let store = self.store();
        let current = store.list(tenant_id).await?;

        let Some(next) = reconcile::reorder_visible(
            &current,
            &request.view,
            &request.visible_ids,
            request.from_index,
            request.to_index,
            self.catalog,
        ) else {
            tracing::debug!("Ignoring no-op reorder for tenant {}", tenant_id);
            return Ok(current);
        };

        store.reorder(tenant_id, &next).await?;
        Ok(next)
    }

    pub async fn on_toggle(
        &self,
        tenant_id: &str,
        module_id: &str,
        enabled: bool,
    ) -> Result<Vec<Module>, StoreError> {
        let store = self.store();
        store.set_enabled(tenant_id, module_id, enabled).await?;
        store.list(tenant_id).await
    }

    /// Resolve and present the data of a custom module
    pub async fn render_data_for(
        &self,
        tenant_id: &str,
        module_id: &str,
    ) -> Result<RenderDataResponse, DashboardError> {
        let store = self.store();
        let module = store
            .find_module(tenant_id, module_id)
            .await?
            .ok_or_else(|| DashboardError::ModuleNotFound(module_id.to_string()))?;
        let fields = module
            .custom
            .ok_or_else(|| DashboardError::NotCustom(module_id.to_string()))?;

        let widget = store
            .find_custom_widget(tenant_id, &fields.custom_widget_id)
            .await?
            .ok_or_else(|| DashboardError::ModuleNotFound(module_id.to_string()))?;

        let render = self
            .interpreter
            .render(&widget.to_module_fields(), tenant_id)
            .await;

        Ok(RenderDataResponse {
            module_id: module.id,
            widget_version: widget.version,
            render_mode: render.render_mode,
            rows: render.rows,
            rendered: render.rendered,
        })
    }

    /// Stored override, `None` when absent or unreadable
    pub async fn get_override(
        &self,
        tenant_id: &str,
        module_id: &str,
    ) -> Option<WidgetConfigOverride> {
        match override_repository::get(self.db, tenant_id, module_id).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to load override of {} for tenant {}: {}",
                    module_id,
                    tenant_id,
                    e
                );
                None
            }
        }
    }

    pub async fn set_override(
        &self,
        tenant_id: &str,
        module_id: &str,
        config: &WidgetConfigOverride,
    ) -> Result<(), StoreError> {
        override_repository::save(self.db, tenant_id, module_id, config).await
    }

    pub async fn list_custom_widgets(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<CustomWidget>, StoreError> {
        self.store().list_custom_widgets(tenant_id).await
    }

    /// Validate the descriptor against the source allow-list, then store the
    /// widget and its module
    pub async fn save_custom_widget(
        &self,
        tenant_id: &str,
        request: UpsertCustomWidgetRequest,
    ) -> Result<(CustomWidget, Module), DashboardError> {
        self.interpreter.validate(&request.data_config, tenant_id)?;
        Ok(self.store().upsert_custom_widget(tenant_id, request).await?)
    }

    pub async fn delete_custom_widget(&self, tenant_id: &str, id: &str) -> Result<(), StoreError> {
        self.store().delete_custom_widget(tenant_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::shared::widgets::catalog::ids;
    use crate::shared::widgets::error::QueryBuildError;
    use crate::shared::widgets::interpreter::InterpreterLimits;
    use crate::shared::widgets::record_store::SqliteRecordStore;
    use crate::shared::widgets::source_registry::SourceRegistry;
    use contracts::shared::widgets::{
        CustomWidgetDataConfig, DisplayConfig, ModuleView, RenderMode, RenderedWidget,
        Temporality, WidgetType,
    };
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    struct Fixture {
        db: DatabaseConnection,
        records: SqliteRecordStore,
        registry: SourceRegistry,
        catalog: WidgetCatalog,
    }

    impl Fixture {
        async fn new() -> Self {
            let db = connect_in_memory().await;
            Self {
                records: SqliteRecordStore::new(db.clone()),
                db,
                registry: SourceRegistry::new(),
                catalog: WidgetCatalog::builtin(),
            }
        }

        fn service(&self) -> DashboardService<'_> {
            let interpreter = WidgetInterpreter::new(
                &self.records,
                &self.registry,
                InterpreterLimits::default(),
            );
            DashboardService::new(&self.db, &self.catalog, interpreter)
        }
    }

    fn kpi_request(table: &str) -> UpsertCustomWidgetRequest {
        let mut data_config = CustomWidgetDataConfig::for_table(table);
        data_config.select = Some("total:count(*)".to_string());
        UpsertCustomWidgetRequest {
            id: None,
            name: "Open cases".to_string(),
            description: None,
            original_prompt: None,
            widget_type: WidgetType::Kpi,
            chart_type: None,
            data_config,
            display_config: DisplayConfig::default(),
            enabled: None,
        }
    }

    fn visible_ids(modules: &[Module], view: &ModuleView, catalog: &WidgetCatalog) -> Vec<String> {
        reconcile::visible_modules(modules, view, catalog)
            .into_iter()
            .map(|m| m.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_reorder_persists_reconciled_list() {
        let fixture = Fixture::new().await;
        let service = fixture.service();
        let view = ModuleView::dashboard();

        let modules = service.get_modules("shop-1").await;
        let ids = visible_ids(&modules, &view, &fixture.catalog);
        let request = ReorderRequest {
            view: view.clone(),
            visible_ids: ids.clone(),
            from_index: 0,
            to_index: 2,
        };

        let next = service.on_reorder("shop-1", &request).await.unwrap();
        let stored = service.get_modules("shop-1").await;
        assert_eq!(stored, next);

        let new_visible = visible_ids(&stored, &view, &fixture.catalog);
        assert_eq!(new_visible[2], ids[0]);
        assert_eq!(new_visible.len(), ids.len());
        assert_eq!(stored.len(), modules.len());
    }

    #[tokio::test]
    async fn test_noop_reorder_keeps_list() {
        let fixture = Fixture::new().await;
        let service = fixture.service();

        let modules = service.get_modules("shop-1").await;
        let request = ReorderRequest {
            view: ModuleView::dashboard(),
            visible_ids: vec![ids::OPEN_CASES.to_string()],
            from_index: 0,
            to_index: 0,
        };
        assert_eq!(service.on_reorder("shop-1", &request).await.unwrap(), modules);
    }

    #[tokio::test]
    async fn test_toggle_hides_module_from_view() {
        let fixture = Fixture::new().await;
        let service = fixture.service();
        let view = ModuleView::dashboard();

        let modules = service
            .on_toggle("shop-1", ids::MONTHLY_REVENUE, false)
            .await
            .unwrap();
        let visible = visible_ids(&modules, &view, &fixture.catalog);
        assert!(!visible.iter().any(|id| id == ids::MONTHLY_REVENUE));
        assert!(modules.iter().any(|m| m.id == ids::MONTHLY_REVENUE));
    }

    #[tokio::test]
    async fn test_render_data_for_custom_kpi() {
        let fixture = Fixture::new().await;
        let service = fixture.service();
        for i in 0..3 {
            fixture
                .db
                .execute(Statement::from_sql_and_values(
                    DatabaseBackend::Sqlite,
                    "INSERT INTO cases (id, tenant_id, case_number, status, created_at) \
                     VALUES (?, 'shop-1', ?, 'open', '2024-03-01')",
                    vec![format!("c{}", i).into(), format!("C-{}", i).into()],
                ))
                .await
                .unwrap();
        }

        let (widget, module) = service
            .save_custom_widget("shop-1", kpi_request("cases"))
            .await
            .unwrap();
        let response = service.render_data_for("shop-1", &module.id).await.unwrap();

        assert_eq!(response.widget_version, widget.version);
        assert_eq!(response.render_mode, RenderMode::Indicator);
        assert_eq!(response.rendered, RenderedWidget::Indicator { value: 3.0 });

        let builtin = service.render_data_for("shop-1", ids::OPEN_CASES).await;
        assert!(matches!(builtin, Err(DashboardError::NotCustom(_))));
        let missing = service.render_data_for("shop-1", "custom_nope").await;
        assert!(matches!(missing, Err(DashboardError::ModuleNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_source_is_rejected_before_storing() {
        let fixture = Fixture::new().await;
        let service = fixture.service();

        let result = service
            .save_custom_widget("shop-1", kpi_request("staff_salaries"))
            .await;
        assert!(matches!(
            result,
            Err(DashboardError::Configuration(QueryBuildError::UnknownSource(_)))
        ));
        assert!(service.list_custom_widgets("shop-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_falls_back_to_catalog_defaults() {
        let fixture = Fixture::new().await;
        let service = fixture.service();
        service
            .on_toggle("shop-1", ids::MONTHLY_REVENUE, false)
            .await
            .unwrap();

        fixture
            .db
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                "DROP TABLE dashboard_module".to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(
            service.get_modules("shop-1").await,
            fixture.catalog.default_modules()
        );
        let toggle = service.on_toggle("shop-1", ids::OPEN_CASES, false).await;
        assert!(matches!(toggle, Err(StoreError::Db(_))));
    }

    #[tokio::test]
    async fn test_reorder_fails_loud_on_undecodable_module() {
        let fixture = Fixture::new().await;
        let service = fixture.service();
        let (_, module) = service
            .save_custom_widget("shop-1", kpi_request("cases"))
            .await
            .unwrap();
        fixture
            .db
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "UPDATE dashboard_module SET custom_json = '{\"legacy\":1}' WHERE module_id = ?",
                vec![module.id.clone().into()],
            ))
            .await
            .unwrap();

        let request = ReorderRequest {
            view: ModuleView::dashboard(),
            visible_ids: vec![ids::OPEN_CASES.to_string(), module.id.clone()],
            from_index: 1,
            to_index: 0,
        };
        assert!(service.on_reorder("shop-1", &request).await.is_err());

        let kept = fixture
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT custom_json FROM dashboard_module WHERE tenant_id = ? AND module_id = ?",
                vec!["shop-1".into(), module.id.clone().into()],
            ))
            .await
            .unwrap();
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_override_round_trip() {
        let fixture = Fixture::new().await;
        let service = fixture.service();

        assert_eq!(service.get_override("shop-1", ids::CASES_BY_STATUS).await, None);

        let config = WidgetConfigOverride {
            temporality: Temporality::Yearly,
            status_filter: None,
            type_filter: Some(vec!["warranty".to_string()]),
        };
        service
            .set_override("shop-1", ids::CASES_BY_STATUS, &config)
            .await
            .unwrap();
        assert_eq!(
            service.get_override("shop-1", ids::CASES_BY_STATUS).await,
            Some(config)
        );
    }
}
