//! Queries against the `ip_history` table.
//!
//! Timestamps are stored as integer milliseconds since the Unix epoch and
//! converted to `DateTime<Utc>` at the boundary.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{RecordFields, RemoteRecord};

/// Outcome of a create-or-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedRow {
    /// Row id of the affected record.
    pub id: i64,
    /// True if an existing row was refreshed instead of inserted.
    pub updated: bool,
}

/// Lists the whole history, newest first.
pub async fn list_history(pool: &SqlitePool) -> Result<Vec<RemoteRecord>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT id, ip, city, region, country, loc, created_at, updated_at \
         FROM ip_history ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(row_to_record).collect()
}

/// Creates or refreshes the row for `fields.ip`.
///
/// A known IP keeps its row and `created_at`; only the location fields and
/// `updated_at` change. An unknown IP gets a fresh row. The create-or-update
/// is a single statement, so concurrent saves of the same ip serialize on
/// the unique index instead of colliding.
pub async fn upsert_history(
    pool: &SqlitePool,
    fields: &RecordFields,
    now: DateTime<Utc>,
) -> Result<SavedRow, DatabaseError> {
    let now_ms = now.timestamp_millis();

    let row = sqlx::query(
        "INSERT INTO ip_history (ip, city, region, country, loc, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(ip) DO UPDATE SET \
             city = excluded.city, \
             region = excluded.region, \
             country = excluded.country, \
             loc = excluded.loc, \
             updated_at = excluded.updated_at \
         RETURNING id, created_at",
    )
    .bind(&fields.ip)
    .bind(&fields.city)
    .bind(&fields.region)
    .bind(&fields.country)
    .bind(&fields.loc)
    .bind(now_ms)
    .bind(now_ms)
    .fetch_one(pool)
    .await?;
    let id: i64 = row.try_get("id")?;
    let created_ms: i64 = row.try_get("created_at")?;
    // a pre-existing row keeps its original created_at
    Ok(SavedRow {
        id,
        updated: created_ms != now_ms,
    })
}

/// Deletes the rows with the given ids; returns how many went away.
pub async fn delete_history(pool: &SqlitePool, ids: &[i64]) -> Result<u64, DatabaseError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("DELETE FROM ip_history WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");
    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

fn row_to_record(row: SqliteRow) -> Result<RemoteRecord, DatabaseError> {
    let id: i64 = row.try_get("id")?;
    let created_ms: i64 = row.try_get("created_at")?;
    let updated_ms: i64 = row.try_get("updated_at")?;
    Ok(RemoteRecord {
        // autoincrement ids start at 1, so the cast is lossless
        id: id as u64,
        ip: row.try_get("ip")?,
        city: row.try_get("city")?,
        region: row.try_get("region")?,
        country: row.try_get("country")?,
        loc: row.try_get("loc")?,
        created_at: DateTime::from_timestamp_millis(created_ms)
            .ok_or(DatabaseError::InvalidTimestamp(created_ms))?,
        updated_at: DateTime::from_timestamp_millis(updated_ms)
            .ok_or(DatabaseError::InvalidTimestamp(updated_ms))?,
    })
}
