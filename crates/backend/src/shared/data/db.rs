use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Tables owned by the dashboard engine plus the record-store sources the
/// custom widget interpreter is allowed to read.
const SCHEMA: &[(&str, &str)] = &[
    (
        "dashboard_module",
        r#"
        CREATE TABLE IF NOT EXISTS dashboard_module (
            tenant_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            is_custom INTEGER NOT NULL DEFAULT 0,
            custom_widget_id TEXT,
            custom_json TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, module_id)
        );
        "#,
    ),
    (
        "custom_widget",
        r#"
        CREATE TABLE IF NOT EXISTS custom_widget (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            original_prompt TEXT,
            widget_type TEXT NOT NULL,
            chart_type TEXT,
            data_config_json TEXT NOT NULL,
            display_config_json TEXT NOT NULL DEFAULT '{}',
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    ),
    (
        "widget_config_override",
        r#"
        CREATE TABLE IF NOT EXISTS widget_config_override (
            tenant_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            override_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, module_id)
        );
        "#,
    ),
    (
        "cases",
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            case_number TEXT NOT NULL,
            status TEXT NOT NULL,
            case_type TEXT NOT NULL DEFAULT 'standard',
            customer_id TEXT,
            device TEXT,
            technician TEXT,
            total REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            closed_at TEXT
        );
        "#,
    ),
    (
        "customers",
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "invoices",
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            case_id TEXT,
            invoice_number TEXT NOT NULL,
            status TEXT NOT NULL,
            amount REAL NOT NULL DEFAULT 0,
            issued_at TEXT NOT NULL,
            paid_at TEXT
        );
        "#,
    ),
    (
        "parts",
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            sku TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT,
            quantity INTEGER NOT NULL DEFAULT 0,
            unit_cost REAL NOT NULL DEFAULT 0
        );
        "#,
    ),
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/dashboard.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Database connection already initialized"))?;
    tracing::info!("Database ready: {}", absolute_path.display());
    Ok(())
}

/// Create missing tables. Safe to run on every start.
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    for (table, ddl) in SCHEMA {
        tracing::debug!("Ensuring table {}", table);
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// Fresh in-memory database with the full schema.
///
/// The pool is pinned to one connection because every SQLite in-memory
/// connection opens its own database.
#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    use sea_orm::ConnectOptions;

    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .expect("in-memory sqlite");
    bootstrap_schema(&conn).await.expect("schema bootstrap");
    conn
}
