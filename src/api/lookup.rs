//! Lookup service client.

use log::debug;

use crate::api::{self, ApiContext};
use crate::config::IP_INFO_PATH;
use crate::error_handling::ApiError;
use crate::models::IpInfo;

/// Fetches geolocation info for `ip`, or for the caller's own address when
/// `ip` is `None`.
///
/// A response without a usable `ip` field is rejected as invalid: every
/// downstream consumer (the cache key, the history store) needs it.
pub async fn fetch_ip_info(ctx: &ApiContext, ip: Option<&str>) -> Result<IpInfo, ApiError> {
    let path = match ip {
        Some(ip) => format!("{IP_INFO_PATH}/{ip}"),
        None => IP_INFO_PATH.to_string(),
    };
    debug!("looking up {}", ip.unwrap_or("own IP"));

    let response = api::send(ctx.get(&path), IP_INFO_PATH).await?;
    let response = api::check_status(response, IP_INFO_PATH).await?;
    let info: IpInfo = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponse {
            endpoint: IP_INFO_PATH.to_string(),
            detail: format!("undecodable body: {e}"),
        })?;

    if info.ip.trim().is_empty() {
        return Err(ApiError::InvalidResponse {
            endpoint: IP_INFO_PATH.to_string(),
            detail: "response is missing `ip`".to_string(),
        });
    }
    Ok(info)
}
