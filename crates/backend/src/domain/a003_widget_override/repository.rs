use chrono::Utc;
use contracts::shared::widgets::WidgetConfigOverride;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::widgets::error::StoreError;

/// Stored override of a module, if any
pub async fn get<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
) -> Result<Option<WidgetConfigOverride>, StoreError> {
    let query = r#"
        SELECT override_json
        FROM widget_config_override
        WHERE tenant_id = ? AND module_id = ?
    "#;

    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            query,
            vec![tenant_id.into(), module_id.into()],
        ))
        .await?;

    match row {
        Some(row) => {
            let json: String = row.try_get("", "override_json")?;
            Ok(Some(serde_json::from_str(&json)?))
        }
        None => Ok(None),
    }
}

pub async fn save<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
    config: &WidgetConfigOverride,
) -> Result<(), StoreError> {
    let override_json = serde_json::to_string(config)?;
    let updated_at = Utc::now().to_rfc3339();

    let query = r#"
        INSERT INTO widget_config_override (tenant_id, module_id, override_json, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(tenant_id, module_id) DO UPDATE SET
            override_json = excluded.override_json,
            updated_at = excluded.updated_at
    "#;

    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        query,
        vec![
            tenant_id.into(),
            module_id.into(),
            override_json.into(),
            updated_at.into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    module_id: &str,
) -> Result<(), StoreError> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM widget_config_override WHERE tenant_id = ? AND module_id = ?",
        vec![tenant_id.into(), module_id.into()],
    ))
    .await?;
    Ok(())
}
