use chrono::Utc;
use contracts::shared::widgets::{CustomModuleFields, Module};
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, QueryOrder, Set};

use crate::shared::widgets::error::StoreError;

mod dashboard_module {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "dashboard_module")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub tenant_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub module_id: String,
        pub enabled: bool,
        pub sort_order: i64,
        pub is_custom: bool,
        pub custom_widget_id: Option<String>,
        pub custom_json: Option<String>,
        pub updated_at: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<dashboard_module::Model> for Module {
    type Error = StoreError;

    fn try_from(m: dashboard_module::Model) -> Result<Self, Self::Error> {
        let custom = match (m.is_custom, m.custom_json.as_deref()) {
            (true, Some(json)) => Some(serde_json::from_str::<CustomModuleFields>(json)?),
            (true, None) => {
                return Err(StoreError::InvalidCustomWidget(format!(
                    "module {} has no custom definition",
                    m.module_id
                )))
            }
            (false, _) => None,
        };

        Ok(Module {
            id: m.module_id,
            enabled: m.enabled,
            order: m.sort_order,
            custom,
        })
    }
}

fn to_active_model(
    tenant_id: &str,
    module: &Module,
) -> Result<dashboard_module::ActiveModel, StoreError> {
    let custom_json = module
        .custom
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(dashboard_module::ActiveModel {
        tenant_id: Set(tenant_id.to_string()),
        module_id: Set(module.id.clone()),
        enabled: Set(module.enabled),
        sort_order: Set(module.order),
        is_custom: Set(module.is_custom()),
        custom_widget_id: Set(module.custom.as_ref().map(|c| c.custom_widget_id.clone())),
        custom_json: Set(custom_json),
        updated_at: Set(Utc::now().to_rfc3339()),
    })
}

/// Stored modules of a tenant in display order. Ties on `sort_order` keep
/// insertion order.
pub async fn list_by_tenant<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
) -> Result<Vec<Module>, StoreError> {
    let models = dashboard_module::Entity::find()
        .filter(dashboard_module::Column::TenantId.eq(tenant_id))
        .order_by_asc(dashboard_module::Column::SortOrder)
        .order_by(Expr::cust("rowid"), Order::Asc)
        .all(db)
        .await?;

    // An undecodable row fails the whole read; a partial list would be
    // written back by the next reorder and lose the row
    models.into_iter().map(Module::try_from).collect()
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
) -> Result<Option<Module>, StoreError> {
    let model = dashboard_module::Entity::find_by_id((tenant_id.to_string(), module_id.to_string()))
        .one(db)
        .await?;
    model.map(Module::try_from).transpose()
}

pub async fn insert_many<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    modules: &[Module],
) -> Result<(), StoreError> {
    if modules.is_empty() {
        return Ok(());
    }
    let models = modules
        .iter()
        .map(|m| to_active_model(tenant_id, m))
        .collect::<Result<Vec<_>, _>>()?;
    dashboard_module::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// Insert or overwrite one module
pub async fn save<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module: &Module,
) -> Result<(), StoreError> {
    let active_model = to_active_model(tenant_id, module)?;
    if find(db, tenant_id, &module.id).await?.is_some() {
        dashboard_module::Entity::update(active_model).exec(db).await?;
    } else {
        active_model.insert(db).await?;
    }
    Ok(())
}

/// Replace the tenant's whole module list
pub async fn replace_all<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    modules: &[Module],
) -> Result<(), StoreError> {
    dashboard_module::Entity::delete_many()
        .filter(dashboard_module::Column::TenantId.eq(tenant_id))
        .exec(db)
        .await?;
    insert_many(db, tenant_id, modules).await
}

/// Flip `enabled` only. Order and custom definition are untouched.
pub async fn set_enabled<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
    enabled: bool,
) -> Result<u64, DbErr> {
    let result = dashboard_module::Entity::update_many()
        .col_expr(dashboard_module::Column::Enabled, Expr::value(enabled))
        .col_expr(
            dashboard_module::Column::UpdatedAt,
            Expr::value(Utc::now().to_rfc3339()),
        )
        .filter(dashboard_module::Column::TenantId.eq(tenant_id))
        .filter(dashboard_module::Column::ModuleId.eq(module_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
) -> Result<u64, DbErr> {
    let result = dashboard_module::Entity::delete_many()
        .filter(dashboard_module::Column::TenantId.eq(tenant_id))
        .filter(dashboard_module::Column::ModuleId.eq(module_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
