//! Remote history store client.
//!
//! Three operations, mirroring the store's REST surface:
//!
//! - `fetch_history` - the full record list, used by resync
//! - `save_record` - idempotent create-or-update keyed by IP
//! - `delete_records` - bulk delete by durable id

use log::debug;

use crate::api::{self, ApiContext};
use crate::config::IP_HISTORY_PATH;
use crate::error_handling::ApiError;
use crate::models::{DeleteRequest, HistoryRecord, RecordFields, RemoteRecord, SaveReceipt};

/// Loads the store's full record list, newest first.
///
/// This is the source of truth a resync replaces the local cache with.
pub async fn fetch_history(ctx: &ApiContext) -> Result<Vec<HistoryRecord>, ApiError> {
    let response = api::send(ctx.get(IP_HISTORY_PATH), IP_HISTORY_PATH).await?;
    let response = api::check_status(response, IP_HISTORY_PATH).await?;
    let records: Vec<RemoteRecord> =
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                endpoint: IP_HISTORY_PATH.to_string(),
                detail: format!("undecodable record list: {e}"),
            })?;
    debug!("history store returned {} records", records.len());
    Ok(records.into_iter().map(HistoryRecord::from).collect())
}

/// Creates or updates the store's record for `fields.ip`.
///
/// The receipt always carries the durable id of the affected row, whether
/// the save inserted a new record or refreshed an existing one.
pub async fn save_record(ctx: &ApiContext, fields: &RecordFields) -> Result<SaveReceipt, ApiError> {
    let response = api::send(ctx.post(IP_HISTORY_PATH).json(fields), IP_HISTORY_PATH).await?;
    let response = api::check_status(response, IP_HISTORY_PATH).await?;
    response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponse {
            endpoint: IP_HISTORY_PATH.to_string(),
            detail: format!("undecodable save receipt: {e}"),
        })
}

/// Deletes the records with the given durable ids in one request.
///
/// Success carries no payload; the caller already knows which ids it sent.
pub async fn delete_records(ctx: &ApiContext, ids: &[u64]) -> Result<(), ApiError> {
    let body = DeleteRequest { ids: ids.to_vec() };
    let response = api::send(ctx.delete(IP_HISTORY_PATH).json(&body), IP_HISTORY_PATH).await?;
    api::check_status(response, IP_HISTORY_PATH).await?;
    debug!("deleted {} records from the history store", ids.len());
    Ok(())
}
