use chrono::Utc;
use contracts::domain::a001_custom_widget::aggregate::{CustomWidget, CustomWidgetId};
use contracts::shared::widgets::{ChartType, CustomWidgetDataConfig, DisplayConfig, WidgetType};
use sea_orm::entity::prelude::*;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::shared::widgets::error::StoreError;

mod custom_widget {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "custom_widget")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub tenant_id: String,
        pub name: String,
        pub description: Option<String>,
        pub original_prompt: Option<String>,
        pub widget_type: String,
        pub chart_type: Option<String>,
        pub data_config_json: String,
        pub display_config_json: String,
        pub enabled: bool,
        pub created_at: chrono::DateTime<chrono::Utc>,
        pub updated_at: chrono::DateTime<chrono::Utc>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Serialized name of a unit enum variant, e.g. `WidgetType::Kpi` -> `"kpi"`
fn variant_name<T: Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn parse_variant<T: DeserializeOwned>(name: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_value(serde_json::Value::String(
        name.to_string(),
    ))?)
}

impl TryFrom<custom_widget::Model> for CustomWidget {
    type Error = StoreError;

    fn try_from(m: custom_widget::Model) -> Result<Self, Self::Error> {
        let id = CustomWidgetId::from_string(&m.id).map_err(StoreError::InvalidCustomWidget)?;
        let widget_type: WidgetType = parse_variant(&m.widget_type)?;
        let chart_type: Option<ChartType> =
            m.chart_type.as_deref().map(parse_variant).transpose()?;
        let data_config: CustomWidgetDataConfig = serde_json::from_str(&m.data_config_json)?;
        let display_config: DisplayConfig =
            serde_json::from_str(&m.display_config_json).unwrap_or_default();

        Ok(CustomWidget {
            id,
            tenant_id: m.tenant_id,
            name: m.name,
            description: m.description,
            original_prompt: m.original_prompt,
            widget_type,
            chart_type,
            data_config,
            display_config,
            enabled: m.enabled,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        })
    }
}

fn to_active_model(widget: &CustomWidget) -> Result<custom_widget::ActiveModel, StoreError> {
    Ok(custom_widget::ActiveModel {
        id: Set(widget.id.as_string()),
        tenant_id: Set(widget.tenant_id.clone()),
        name: Set(widget.name.clone()),
        description: Set(widget.description.clone()),
        original_prompt: Set(widget.original_prompt.clone()),
        widget_type: Set(variant_name(&widget.widget_type)?),
        chart_type: Set(widget.chart_type.as_ref().map(variant_name).transpose()?),
        data_config_json: Set(serde_json::to_string(&widget.data_config)?),
        display_config_json: Set(serde_json::to_string(&widget.display_config)?),
        enabled: Set(widget.enabled),
        created_at: Set(widget.created_at),
        updated_at: Set(widget.updated_at),
        version: Set(widget.version),
    })
}

/// Custom widgets of a tenant, oldest first. Rows that no longer decode are
/// skipped with a warning.
pub async fn list_by_tenant<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
) -> Result<Vec<CustomWidget>, StoreError> {
    let models = custom_widget::Entity::find()
        .filter(custom_widget::Column::TenantId.eq(tenant_id))
        .order_by_asc(custom_widget::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(models
        .into_iter()
        .filter_map(|m| {
            let id = m.id.clone();
            match CustomWidget::try_from(m) {
                Ok(widget) => Some(widget),
                Err(e) => {
                    tracing::warn!("Skipping undecodable custom widget {}: {}", id, e);
                    None
                }
            }
        })
        .collect())
}

/// Ids of a tenant's custom widgets
pub async fn list_ids<C: ConnectionTrait>(db: &C, tenant_id: &str) -> Result<Vec<String>, DbErr> {
    let models = custom_widget::Entity::find()
        .filter(custom_widget::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;
    Ok(models.into_iter().map(|m| m.id).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    id: &CustomWidgetId,
) -> Result<Option<CustomWidget>, StoreError> {
    let model = custom_widget::Entity::find_by_id(id.as_string())
        .filter(custom_widget::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?;
    model.map(CustomWidget::try_from).transpose()
}

pub async fn insert<C: ConnectionTrait>(db: &C, widget: &CustomWidget) -> Result<(), StoreError> {
    to_active_model(widget)?.insert(db).await?;
    Ok(())
}

/// Overwrite a stored widget. The caller owns `version`.
pub async fn update<C: ConnectionTrait>(db: &C, widget: &CustomWidget) -> Result<(), StoreError> {
    let mut active_model = to_active_model(widget)?;
    active_model.updated_at = Set(Utc::now());
    custom_widget::Entity::update(active_model).exec(db).await?;
    Ok(())
}

pub async fn set_enabled<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    id: &str,
    enabled: bool,
) -> Result<u64, DbErr> {
    let result = custom_widget::Entity::update_many()
        .col_expr(custom_widget::Column::Enabled, Expr::value(enabled))
        .col_expr(custom_widget::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(custom_widget::Column::TenantId.eq(tenant_id))
        .filter(custom_widget::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete<C: ConnectionTrait>(db: &C, tenant_id: &str, id: &str) -> Result<u64, DbErr> {
    let result = custom_widget::Entity::delete_many()
        .filter(custom_widget::Column::TenantId.eq(tenant_id))
        .filter(custom_widget::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
