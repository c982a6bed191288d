//! SQLite pool setup for the bundled history store.
//!
//! The store keeps its whole state in one SQLite file. Opening the pool
//! creates that file (and its parent directory) on first run, switches the
//! journal to WAL so reads proceed while a write is in flight, and sets a
//! busy timeout so concurrent handlers wait for the writer instead of
//! failing with `SQLITE_BUSY`.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::error_handling::DatabaseError;

/// Opens the history database at `db_path`, creating it if absent.
pub async fn init_db_pool(db_path: &Path) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::FileCreationError(e.to_string()))?;
        }
    }

    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(db_path)
    {
        Ok(_) => info!("Created history database at {}", db_path.display()),
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!("Reusing history database at {}", db_path.display());
        }
        Err(e) => {
            error!("Failed to create history database file: {e}");
            return Err(DatabaseError::FileCreationError(e.to_string()));
        }
    }

    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .map_err(|e| {
            error!("Failed to open history database: {e}");
            DatabaseError::SqlError(e)
        })?;

    for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA busy_timeout=5000"] {
        sqlx::query(pragma).execute(&pool).await.map_err(|e| {
            error!("Failed to apply {pragma}: {e}");
            DatabaseError::SqlError(e)
        })?;
    }

    Ok(Arc::new(pool))
}
