use crate::{Error, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open (or create) the service's SQLite store at the given file path.
///
/// WAL mode, small pool. The pool is the process-scoped store resource;
/// construct it once at startup and inject it into the stores.
pub async fn connect(path: impl AsRef<Path>) -> Result<SqlitePool> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::backend("sqlite_store", e))?;
    }

    let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path.display()))
        .map_err(|e| Error::backend("sqlite_store", e))?
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(|e| Error::backend("sqlite_store", e))?;

    Ok(pool)
}

/// In-memory store for tests. A single connection, so every query sees the
/// same database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| Error::backend("sqlite_store", e))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .map_err(|e| Error::backend("sqlite_store", e))?;

    Ok(pool)
}
