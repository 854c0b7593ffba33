//! SQLite pool bootstrap and schema.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;

/// Maximum pooled connections; contact and status traffic is low-volume.
const MAX_CONNECTIONS: u32 = 5;

/// Open (creating if missing) the docrelay database at `path`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the file cannot be created or opened.
pub async fn open(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .pragma("journal_mode", "WAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;
    debug!(path = %path.display(), "database opened");
    Ok(pool)
}

/// Open an in-memory database, used by tests and dry runs.
///
/// # Errors
///
/// Returns [`sqlx::Error`] on connection failure.
pub async fn open_in_memory() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
}

/// Create the contact and message tables if they do not exist. Idempotent.
///
/// # Errors
///
/// Returns [`sqlx::Error`] on DDL failure.
pub async fn init_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS whatsapp_contacts (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            client_id TEXT,
            phone_number TEXT NOT NULL,
            name TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            last_verified_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (tenant_id, client_id, phone_number)
        )",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS whatsapp_messages (
            message_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            sent_at TEXT,
            delivered_at TEXT,
            read_at TEXT,
            error_message TEXT
        )",
    )
    .execute(db)
    .await?;

    Ok(())
}
