//! Schema migration management for the bundled history store.

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Applies the migrations compiled in from the `migrations/` directory.
///
/// The migrations are embedded at build time so `serve` works no matter
/// where the installed binary runs from.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
