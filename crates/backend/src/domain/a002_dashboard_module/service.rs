//! Module configuration store
//!
//! Tenant-scoped persistence of the module list. The list is seeded from the
//! builtin catalog on first access, picks up builtins added to the catalog
//! later, and never keeps a custom module whose widget is gone.

use std::collections::HashSet;

use contracts::domain::a001_custom_widget::aggregate::{CustomWidget, CustomWidgetId};
use contracts::shared::widgets::{custom_module_id, Module, UpsertCustomWidgetRequest};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a001_custom_widget::repository as widget_repository;
use crate::domain::a003_widget_override::repository as override_repository;
use crate::shared::widgets::catalog::WidgetCatalog;
use crate::shared::widgets::error::StoreError;

pub struct ModuleStore<'a> {
    db: &'a DatabaseConnection,
    catalog: &'a WidgetCatalog,
}

impl<'a> ModuleStore<'a> {
    pub fn new(db: &'a DatabaseConnection, catalog: &'a WidgetCatalog) -> Self {
        Self { db, catalog }
    }

    /// Stored list merged with the catalog: an empty store is seeded with the
    /// catalog defaults, builtins missing from a non-empty store are appended
    /// after the highest stored order.
    async fn load_seeded<C: ConnectionTrait>(
        &self,
        db: &C,
        tenant_id: &str,
    ) -> Result<Vec<Module>, StoreError> {
        let mut modules = repository::list_by_tenant(db, tenant_id).await?;

        if modules.is_empty() {
            let defaults = self.catalog.default_modules();
            repository::insert_many(db, tenant_id, &defaults).await?;
            tracing::info!(
                "Seeded {} dashboard modules for tenant {}",
                defaults.len(),
                tenant_id
            );
            return Ok(defaults);
        }

        let known: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();
        let max_order = modules.iter().map(|m| m.order).max().unwrap_or(0);
        let mut missing: Vec<Module> = self
            .catalog
            .list()
            .iter()
            .filter(|w| !known.contains(w.id.as_str()))
            .map(|w| {
                let mut module = WidgetCatalog::default_module(w);
                module.order = max_order + w.default_position;
                module
            })
            .collect();

        if !missing.is_empty() {
            missing.sort_by_key(|m| m.order);
            repository::insert_many(db, tenant_id, &missing).await?;
            tracing::info!(
                "Added {} new catalog modules for tenant {}",
                missing.len(),
                tenant_id
            );
            modules.extend(missing);
        }

        Ok(modules)
    }

    /// Module list of a tenant in display order
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<Module>, StoreError> {
        let modules = self.load_seeded(self.db, tenant_id).await?;

        let widget_ids: HashSet<String> = widget_repository::list_ids(self.db, tenant_id)
            .await?
            .into_iter()
            .collect();

        let mut result = Vec::with_capacity(modules.len());
        for module in modules {
            let orphaned = module
                .custom
                .as_ref()
                .map(|c| !widget_ids.contains(&c.custom_widget_id))
                .unwrap_or(false);

            if orphaned {
                tracing::warn!(
                    "Dropping module {} of tenant {}: custom widget no longer exists",
                    module.id,
                    tenant_id
                );
                repository::delete(self.db, tenant_id, &module.id).await?;
                continue;
            }
            result.push(module);
        }

        Ok(result)
    }

    pub async fn find_module(
        &self,
        tenant_id: &str,
        module_id: &str,
    ) -> Result<Option<Module>, StoreError> {
        repository::find(self.db, tenant_id, module_id).await
    }

    /// Change the enabled flag of one module. Other modules and the order are
    /// left untouched.
    pub async fn set_enabled(
        &self,
        tenant_id: &str,
        module_id: &str,
        enabled: bool,
    ) -> Result<(), StoreError> {
        let mut affected = repository::set_enabled(self.db, tenant_id, module_id, enabled).await?;

        if affected == 0 {
            // Tenant may not be seeded yet
            self.list(tenant_id).await?;
            affected = repository::set_enabled(self.db, tenant_id, module_id, enabled).await?;
        }
        if affected == 0 {
            return Err(StoreError::ModuleNotFound(module_id.to_string()));
        }

        if let Some(module) = repository::find(self.db, tenant_id, module_id).await? {
            if let Some(custom) = module.custom {
                widget_repository::set_enabled(
                    self.db,
                    tenant_id,
                    &custom.custom_widget_id,
                    enabled,
                )
                .await?;
            }
        }

        tracing::debug!(
            "Module {} of tenant {} set enabled={}",
            module_id,
            tenant_id,
            enabled
        );
        Ok(())
    }

    /// Persist a full module list. Array position becomes the stored order.
    ///
    /// Whole-list replace: of two concurrent writers, the last one wins.
    pub async fn reorder(&self, tenant_id: &str, modules: &[Module]) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(modules.len());
        for module in modules {
            if !seen.insert(module.id.as_str()) {
                return Err(StoreError::DuplicateModuleId(module.id.clone()));
            }
        }

        let renumbered: Vec<Module> = modules
            .iter()
            .enumerate()
            .map(|(index, m)| Module {
                order: index as i64 + 1,
                ..m.clone()
            })
            .collect();

        let txn = self.db.begin().await?;
        repository::replace_all(&txn, tenant_id, &renumbered).await?;
        txn.commit().await?;

        tracing::debug!(
            "Stored order of {} modules for tenant {}",
            renumbered.len(),
            tenant_id
        );
        Ok(())
    }

    pub async fn list_custom_widgets(&self, tenant_id: &str) -> Result<Vec<CustomWidget>, StoreError> {
        widget_repository::list_by_tenant(self.db, tenant_id).await
    }

    pub async fn find_custom_widget(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<CustomWidget>, StoreError> {
        let id = CustomWidgetId::from_string(id).map_err(StoreError::InvalidCustomWidget)?;
        widget_repository::find_by_id(self.db, tenant_id, &id).await
    }

    /// Create or update a custom widget together with its module.
    ///
    /// An update keeps the module's order and bumps the widget version; a
    /// new widget is appended after the last module.
    pub async fn upsert_custom_widget(
        &self,
        tenant_id: &str,
        request: UpsertCustomWidgetRequest,
    ) -> Result<(CustomWidget, Module), StoreError> {
        let txn = self.db.begin().await?;

        let existing = match request.id.as_deref() {
            Some(id) => {
                let id = CustomWidgetId::from_string(id).map_err(StoreError::InvalidCustomWidget)?;
                let widget = widget_repository::find_by_id(&txn, tenant_id, &id)
                    .await?
                    .ok_or_else(|| StoreError::CustomWidgetNotFound(id.as_string()))?;
                Some(widget)
            }
            None => None,
        };
        let is_new = existing.is_none();

        let mut widget = match existing {
            Some(mut widget) => {
                widget.version += 1;
                widget.name = request.name;
                widget.widget_type = request.widget_type;
                widget.data_config = request.data_config;
                widget
            }
            None => CustomWidget::new_for_insert(
                tenant_id.to_string(),
                request.name,
                request.widget_type,
                request.data_config,
            ),
        };
        widget.description = request.description;
        widget.original_prompt = request.original_prompt;
        widget.chart_type = request.chart_type;
        widget.display_config = request.display_config;
        if let Some(enabled) = request.enabled {
            widget.enabled = enabled;
        }

        widget.validate().map_err(StoreError::InvalidCustomWidget)?;
        widget.before_write();

        if is_new {
            widget_repository::insert(&txn, &widget).await?;
        } else {
            widget_repository::update(&txn, &widget).await?;
        }

        let modules = self.load_seeded(&txn, tenant_id).await?;
        let module_id = widget.module_id();
        let order = match modules.iter().find(|m| m.id == module_id) {
            Some(current) => current.order,
            None => modules.iter().map(|m| m.order).max().unwrap_or(0) + 1,
        };
        let module = Module::custom(widget.to_module_fields(), widget.enabled, order);
        repository::save(&txn, tenant_id, &module).await?;

        txn.commit().await?;

        tracing::info!(
            "{} custom widget {} (v{}) for tenant {}",
            if is_new { "Created" } else { "Updated" },
            widget.id.as_string(),
            widget.version,
            tenant_id
        );
        Ok((widget, module))
    }

    /// Delete a custom widget, its module and its override
    pub async fn delete_custom_widget(&self, tenant_id: &str, id: &str) -> Result<(), StoreError> {
        let module_id = custom_module_id(id);

        let txn = self.db.begin().await?;
        let widgets = widget_repository::delete(&txn, tenant_id, id).await?;
        let modules = repository::delete(&txn, tenant_id, &module_id).await?;
        override_repository::delete(&txn, tenant_id, &module_id).await?;

        if widgets == 0 && modules == 0 {
            txn.rollback().await?;
            return Err(StoreError::CustomWidgetNotFound(id.to_string()));
        }
        txn.commit().await?;

        tracing::info!("Deleted custom widget {} of tenant {}", id, tenant_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::shared::widgets::catalog::ids;
    use contracts::shared::widgets::{
        CustomWidgetDataConfig, DisplayConfig, WidgetCategory, WidgetDescriptor, WidgetSize,
        WidgetType,
    };
    use sea_orm::{DatabaseBackend, Statement};

    fn request(name: &str) -> UpsertCustomWidgetRequest {
        UpsertCustomWidgetRequest {
            id: None,
            name: name.to_string(),
            description: Some("Open cases per status".to_string()),
            original_prompt: Some("show me open cases by status".to_string()),
            widget_type: WidgetType::Chart,
            chart_type: None,
            data_config: CustomWidgetDataConfig::for_table("cases"),
            display_config: DisplayConfig::default(),
            enabled: None,
        }
    }

    fn ids_of(modules: &[Module]) -> Vec<&str> {
        modules.iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_first_list_seeds_catalog_defaults() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let modules = store.list("shop-1").await.unwrap();
        assert_eq!(modules, catalog.default_modules());

        // Second read comes from storage
        assert_eq!(store.list("shop-1").await.unwrap(), modules);
    }

    #[tokio::test]
    async fn test_new_catalog_entries_are_appended() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        ModuleStore::new(&db, &catalog).list("shop-1").await.unwrap();

        let mut widgets = catalog.list().to_vec();
        widgets.push(WidgetDescriptor {
            id: "pending_quotes".to_string(),
            label: "Pending quotes".to_string(),
            category: WidgetCategory::Dashboard,
            default_enabled: true,
            default_size: WidgetSize::Small,
            default_position: 1,
        });
        let extended = WidgetCatalog::from_descriptors(widgets);

        let modules = ModuleStore::new(&db, &extended).list("shop-1").await.unwrap();
        let last = modules.last().unwrap();
        assert_eq!(last.id, "pending_quotes");
        assert!(modules[..modules.len() - 1]
            .iter()
            .all(|m| m.order < last.order));
    }

    #[tokio::test]
    async fn test_toggle_touches_only_enabled() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);
        let before = store.list("shop-1").await.unwrap();

        store
            .set_enabled("shop-1", ids::RECENT_CASES, false)
            .await
            .unwrap();
        let after = store.list("shop-1").await.unwrap();

        assert_eq!(ids_of(&before), ids_of(&after));
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.order, a.order);
            let expected = if a.id == ids::RECENT_CASES { false } else { b.enabled };
            assert_eq!(a.enabled, expected);
        }

        let missing = store.set_enabled("shop-1", "nope", true).await;
        assert!(matches!(missing, Err(StoreError::ModuleNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_seeds_unknown_tenant() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        store
            .set_enabled("fresh", ids::YEAR_OVER_YEAR, true)
            .await
            .unwrap();
        let modules = store.list("fresh").await.unwrap();
        let module = modules.iter().find(|m| m.id == ids::YEAR_OVER_YEAR).unwrap();
        assert!(module.enabled);
    }

    #[tokio::test]
    async fn test_reorder_is_last_write_wins() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);
        let modules = store.list("shop-1").await.unwrap();

        let mut first = modules.clone();
        first.reverse();
        let mut second = modules.clone();
        second.swap(0, 1);

        store.reorder("shop-1", &first).await.unwrap();
        store.reorder("shop-1", &second).await.unwrap();

        let stored = store.list("shop-1").await.unwrap();
        assert_eq!(ids_of(&stored), ids_of(&second));
        let orders: Vec<i64> = stored.iter().map(|m| m.order).collect();
        assert_eq!(orders, (1..=stored.len() as i64).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicates() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);
        let mut modules = store.list("shop-1").await.unwrap();
        modules.push(modules[0].clone());

        let result = store.reorder("shop-1", &modules).await;
        assert!(matches!(result, Err(StoreError::DuplicateModuleId(_))));
        assert_eq!(store.list("shop-1").await.unwrap().len(), modules.len() - 1);
    }

    #[tokio::test]
    async fn test_custom_widget_lifecycle() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let (widget, module) = store
            .upsert_custom_widget("shop-1", request("Cases by status"))
            .await
            .unwrap();
        assert_eq!(widget.version, 1);
        assert_eq!(module.id, widget.module_id());

        let modules = store.list("shop-1").await.unwrap();
        assert_eq!(modules.last().unwrap(), &module);
        assert_eq!(modules.len(), catalog.list().len() + 1);

        // Update keeps the slot and bumps the version
        let mut update = request("Cases per status");
        update.id = Some(widget.id.as_string());
        let (updated, updated_module) = store.upsert_custom_widget("shop-1", update).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated_module.order, module.order);
        assert_eq!(
            updated_module.custom.as_ref().unwrap().name,
            "Cases per status"
        );

        // Other tenants cannot see or delete it
        assert!(store.list_custom_widgets("shop-2").await.unwrap().is_empty());
        let foreign = store
            .delete_custom_widget("shop-2", &widget.id.as_string())
            .await;
        assert!(matches!(foreign, Err(StoreError::CustomWidgetNotFound(_))));

        store
            .delete_custom_widget("shop-1", &widget.id.as_string())
            .await
            .unwrap();
        let modules = store.list("shop-1").await.unwrap();
        assert!(modules.iter().all(|m| !m.is_custom()));
        assert!(store.list_custom_widgets("shop-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_module_round_trips_losslessly() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let mut req = request("Revenue");
        req.data_config = serde_json::from_value(serde_json::json!({
            "table": "invoices",
            "select": "name:status, value:sum(amount)",
            "filters": [{"column": "status", "operator": "neq", "value": "void"}],
            "orderBy": "value",
            "ascending": false,
            "limit": 20
        }))
        .unwrap();
        req.display_config = serde_json::from_value(serde_json::json!({
            "title": "Revenue by status",
            "format": {"kind": "Money", "currency": "EUR"},
            "legend": {"position": "bottom"}
        }))
        .unwrap();

        let (_, module) = store.upsert_custom_widget("shop-1", req).await.unwrap();
        let stored = store.find_module("shop-1", &module.id).await.unwrap().unwrap();
        assert_eq!(stored, module);
    }

    #[tokio::test]
    async fn test_orphaned_custom_modules_are_dropped() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let (widget, _) = store
            .upsert_custom_widget("shop-1", request("Orphan"))
            .await
            .unwrap();
        widget_repository::delete(&db, "shop-1", &widget.id.as_string())
            .await
            .unwrap();

        let modules = store.list("shop-1").await.unwrap();
        assert!(modules.iter().all(|m| m.id != widget.module_id()));
        assert!(store
            .find_module("shop-1", &widget.module_id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_toggle_keeps_custom_definition_and_order() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let (widget, module) = store
            .upsert_custom_widget("shop-1", request("Cases by status"))
            .await
            .unwrap();
        store.set_enabled("shop-1", &module.id, false).await.unwrap();

        let stored = store.find_module("shop-1", &module.id).await.unwrap().unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.order, module.order);
        assert_eq!(stored.custom, module.custom);

        let widgets = store.list_custom_widgets("shop-1").await.unwrap();
        assert_eq!(widgets.len(), 1);
        assert!(!widgets[0].enabled);
        assert_eq!(widgets[0].version, widget.version);
    }

    #[tokio::test]
    async fn test_undecodable_module_fails_reads_instead_of_vanishing() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let (widget, module) = store
            .upsert_custom_widget("shop-1", request("Legacy"))
            .await
            .unwrap();
        db.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE dashboard_module SET custom_json = '{\"legacy\":1}' \
             WHERE tenant_id = ? AND module_id = ?",
            vec!["shop-1".into(), module.id.clone().into()],
        ))
        .await
        .unwrap();

        let result = store.list("shop-1").await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));

        let rows = db
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM dashboard_module WHERE tenant_id = 'shop-1'".to_string(),
            ))
            .await
            .unwrap()
            .unwrap()
            .try_get::<i64>("", "n")
            .unwrap();
        assert_eq!(rows as usize, catalog.list().len() + 1);
        assert_eq!(store.list_custom_widgets("shop-1").await.unwrap()[0].id, widget.id);
    }

    #[tokio::test]
    async fn test_invalid_widget_is_rejected() {
        let db = connect_in_memory().await;
        let catalog = WidgetCatalog::builtin();
        let store = ModuleStore::new(&db, &catalog);

        let mut req = request("  ");
        req.widget_type = WidgetType::Kpi;
        let result = store.upsert_custom_widget("shop-1", req).await;
        assert!(matches!(result, Err(StoreError::InvalidCustomWidget(_))));
        assert!(store.list_custom_widgets("shop-1").await.unwrap().is_empty());
    }
}
