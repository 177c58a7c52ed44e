//! Builtin widget catalog
//!
//! Code-defined metadata for every widget the dashboard ships with. Module
//! rows for these widgets are seeded from here the first time a tenant's
//! dashboard is read.

use contracts::shared::widgets::{
    Module, WidgetCatalogResponse, WidgetCategory, WidgetDescriptor, WidgetSize,
};

/// Well-known builtin widget ids (constants to avoid typos).
pub mod ids {
    pub const OPEN_CASES: &str = "open_cases";
    pub const CASES_IN_PROGRESS: &str = "cases_in_progress";
    pub const READY_FOR_PICKUP: &str = "ready_for_pickup";
    pub const MONTHLY_REVENUE: &str = "monthly_revenue";
    pub const CASES_BY_STATUS: &str = "cases_by_status";
    pub const RECENT_CASES: &str = "recent_cases";
    pub const TECHNICIAN_WORKLOAD: &str = "technician_workload";
    pub const AVERAGE_REPAIR_TIME: &str = "average_repair_time";
    pub const WARRANTY_RETURNS: &str = "warranty_returns";
    pub const REVENUE_BY_CASE_TYPE: &str = "revenue_by_case_type";
    pub const INSURANCE_TAKEOVERS: &str = "insurance_takeovers";
    pub const PARTS_CONSUMPTION: &str = "parts_consumption";
    pub const YEAR_OVER_YEAR: &str = "year_over_year";
}

fn descriptor(
    id: &str,
    label: &str,
    category: WidgetCategory,
    default_enabled: bool,
    default_size: WidgetSize,
    default_position: i64,
) -> WidgetDescriptor {
    WidgetDescriptor {
        id: id.to_string(),
        label: label.to_string(),
        category,
        default_enabled,
        default_size,
        default_position,
    }
}

/// Immutable set of builtin widget descriptors.
pub struct WidgetCatalog {
    widgets: Vec<WidgetDescriptor>,
}

impl WidgetCatalog {
    /// The catalog shipped with the application.
    pub fn builtin() -> Self {
        use WidgetCategory::{Advanced, Dashboard, Standard};
        use WidgetSize::{Full, Large, Medium, Small};

        Self::from_descriptors(vec![
            descriptor(ids::OPEN_CASES, "Open cases", Dashboard, true, Small, 1),
            descriptor(ids::CASES_IN_PROGRESS, "In progress", Dashboard, true, Small, 2),
            descriptor(ids::READY_FOR_PICKUP, "Ready for pickup", Dashboard, true, Small, 3),
            descriptor(ids::MONTHLY_REVENUE, "Monthly revenue", Dashboard, true, Medium, 4),
            descriptor(ids::CASES_BY_STATUS, "Cases by status", Dashboard, true, Medium, 5),
            descriptor(ids::RECENT_CASES, "Recent cases", Dashboard, true, Large, 6),
            descriptor(ids::TECHNICIAN_WORKLOAD, "Technician workload", Standard, true, Medium, 7),
            descriptor(ids::AVERAGE_REPAIR_TIME, "Average repair time", Standard, false, Small, 8),
            descriptor(ids::WARRANTY_RETURNS, "Warranty returns", Standard, false, Small, 9),
            descriptor(ids::REVENUE_BY_CASE_TYPE, "Revenue by case type", Advanced, false, Large, 10),
            descriptor(ids::INSURANCE_TAKEOVERS, "Insurance take-overs", Advanced, false, Large, 11),
            descriptor(ids::PARTS_CONSUMPTION, "Parts consumption", Advanced, false, Medium, 12),
            descriptor(ids::YEAR_OVER_YEAR, "Year over year", Advanced, false, Full, 13),
        ])
    }

    pub fn from_descriptors(widgets: Vec<WidgetDescriptor>) -> Self {
        Self { widgets }
    }

    pub fn list(&self) -> &[WidgetDescriptor] {
        &self.widgets
    }

    pub fn get(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Category of a module. Custom widgets live on the main dashboard;
    /// builtin ids the catalog no longer knows fall back to `Standard`.
    pub fn category_of(&self, module: &Module) -> WidgetCategory {
        if module.is_custom() {
            return WidgetCategory::Dashboard;
        }
        self.get(&module.id)
            .map(|w| w.category)
            .unwrap_or(WidgetCategory::Standard)
    }

    /// Module for a builtin widget in its catalog default state.
    pub fn default_module(descriptor: &WidgetDescriptor) -> Module {
        Module::builtin(
            descriptor.id.clone(),
            descriptor.default_enabled,
            descriptor.default_position,
        )
    }

    /// Every builtin widget at its default state, sorted by default position.
    /// Used for first-time seeding and as the fallback when the store is unreadable.
    pub fn default_modules(&self) -> Vec<Module> {
        let mut modules: Vec<Module> = self.widgets.iter().map(Self::default_module).collect();
        modules.sort_by_key(|m| m.order);
        modules
    }

    pub fn to_response(&self) -> WidgetCatalogResponse {
        WidgetCatalogResponse {
            widgets: self.widgets.clone(),
        }
    }
}

impl Default for WidgetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

static CATALOG: std::sync::OnceLock<WidgetCatalog> = std::sync::OnceLock::new();

/// Get the global builtin catalog
pub fn get_catalog() -> &'static WidgetCatalog {
    CATALOG.get_or_init(WidgetCatalog::builtin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::widgets::{
        CustomModuleFields, CustomWidgetDataConfig, DisplayConfig, WidgetType,
    };
    use std::collections::HashSet;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = WidgetCatalog::builtin();
        let ids: HashSet<_> = catalog.list().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.list().len());
        assert!(catalog.list().iter().all(|w| !w.is_custom()));
    }

    #[test]
    fn test_default_modules_follow_catalog_defaults() {
        let catalog = WidgetCatalog::builtin();
        let modules = catalog.default_modules();

        assert_eq!(modules.len(), catalog.list().len());
        assert!(modules.windows(2).all(|w| w[0].order <= w[1].order));
        for module in &modules {
            let descriptor = catalog.get(&module.id).unwrap();
            assert_eq!(module.enabled, descriptor.default_enabled);
            assert!(!module.is_custom());
        }
    }

    #[test]
    fn test_category_of() {
        let catalog = WidgetCatalog::builtin();
        assert_eq!(
            catalog.category_of(&Module::builtin(ids::YEAR_OVER_YEAR, true, 1)),
            WidgetCategory::Advanced
        );
        assert_eq!(
            catalog.category_of(&Module::builtin("retired_widget", true, 1)),
            WidgetCategory::Standard
        );

        let custom = Module::custom(
            CustomModuleFields {
                custom_widget_id: "abc".into(),
                name: "Mine".into(),
                description: None,
                original_prompt: None,
                widget_type: WidgetType::Kpi,
                chart_type: None,
                data_config: CustomWidgetDataConfig::for_table("cases"),
                display_config: DisplayConfig::default(),
            },
            true,
            99,
        );
        assert_eq!(catalog.category_of(&custom), WidgetCategory::Dashboard);
    }
}
