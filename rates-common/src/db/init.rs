//! Database initialization
//!
//! Two entry points:
//! - [`init_database`] opens (creating if needed) a read-write pool and runs
//!   migrations. Used by the `migrate` and `rebuild-codes` commands.
//! - [`connect_readonly`] opens an existing database for serving requests.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Connection cap for the serving pool; bounds concurrent aggregate queries
pub const MAX_READ_CONNECTIONS: u32 = 16;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Connect to an existing database in read-only mode
///
/// The request path never writes, so the serving pool is opened with
/// SQLite's read-only flag.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Config(format!(
            "Database not found: {}\nRun `rates-api migrate` first to initialize it.",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_READ_CONNECTIONS)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub(crate) async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the regions table
///
/// Regions form a tree through `parent_slug`; top-level regions have none.
pub async fn create_regions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            slug TEXT PRIMARY KEY,
            name TEXT,
            parent_slug TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the ports table
pub async fn create_ports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ports (
            code TEXT PRIMARY KEY,
            name TEXT,
            parent_slug TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the raw prices fact table
///
/// `day` holds ISO `YYYY-MM-DD` text so lexical and calendar order agree.
pub async fn create_prices_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prices (
            orig_code TEXT NOT NULL,
            dest_code TEXT NOT NULL,
            day DATE NOT NULL,
            price INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prices_lane_day ON prices (orig_code, dest_code, day)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
