//! Bundled history store server.
//!
//! A small axum server implementing the API surface the client consumes,
//! so the tool runs end to end without an external backend:
//!
//! - `GET /api/ip-history` - full record list, newest first
//! - `POST /api/ip-history` - create-or-update keyed by IP
//! - `DELETE /api/ip-history` - bulk delete by id
//! - `GET /api/ip-info` and `GET /api/ip-info/{ip}` - geolocation proxy
//!   to a configurable upstream provider
//!
//! Records persist in SQLite. If a bearer token is configured, every
//! endpoint requires it and refuses other callers with a 403.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use log::{debug, error, info};
use serde_json::json;
use sqlx::SqlitePool;

use crate::api::extract_api_message;
use crate::config::{
    Config, DEFAULT_DB_PATH, DEFAULT_GEO_BASE, DEFAULT_SERVE_PORT, HISTORY_UPDATED_MESSAGE,
};
use crate::initialization::init_client;
use crate::models::{DeleteRequest, RecordFields, SaveReceipt};
use crate::storage;

/// Configuration for the bundled server.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Port to listen on (always binds 127.0.0.1).
    pub port: u16,
    /// SQLite database file backing the history.
    pub db_path: PathBuf,
    /// If set, every request must carry this bearer token.
    pub require_token: Option<String>,
    /// Base URL of the geolocation provider to proxy lookups to.
    pub geo_base: String,
    /// Token for the geolocation provider, if it needs one.
    pub geo_token: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            port: DEFAULT_SERVE_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            require_token: None,
            geo_base: DEFAULT_GEO_BASE.to_string(),
            geo_token: None,
        }
    }
}

/// Shared state for the store server.
#[derive(Clone)]
struct StoreState {
    pool: Arc<SqlitePool>,
    http: reqwest::Client,
    require_token: Option<String>,
    geo_base: String,
    geo_token: Option<String>,
}

/// Builds the router with its database pool and proxy client.
///
/// Split out from [`start_store_server`] so tests can bind an ephemeral
/// port themselves.
pub async fn build_store(config: &ServeConfig) -> Result<Router, anyhow::Error> {
    let pool = storage::init_db_pool(&config.db_path).await?;
    storage::run_migrations(pool.as_ref()).await?;
    let http = init_client(&Config::default())?;

    let state = StoreState {
        pool,
        http,
        require_token: config.require_token.clone(),
        geo_base: config.geo_base.trim_end_matches('/').to_string(),
        geo_token: config.geo_token.clone(),
    };

    Ok(Router::new()
        .route(
            "/api/ip-history",
            get(history_list_handler)
                .post(history_save_handler)
                .delete(history_delete_handler),
        )
        .route("/api/ip-info", get(own_ip_info_handler))
        .route("/api/ip-info/{ip}", get(ip_info_handler))
        .with_state(state))
}

/// Creates and starts the history store server.
pub async fn start_store_server(config: ServeConfig) -> Result<(), anyhow::Error> {
    let app = build_store(&config).await?;
    let port = config.port;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind history store to port {}: {}", port, e))?;

    info!("History store listening on http://127.0.0.1:{}/", port);
    info!("  - History: http://127.0.0.1:{}/api/ip-history", port);
    info!("  - Lookup proxy: http://127.0.0.1:{}/api/ip-info", port);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("History store server error: {}", e))?;

    Ok(())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Rejects requests without the configured bearer token.
fn require_auth(state: &StoreState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.require_token else {
        return Ok(());
    };
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {expected}"))
        .unwrap_or(false);
    if authorized {
        Ok(())
    } else {
        debug!("rejecting request without a valid bearer token");
        Err(error_response(StatusCode::FORBIDDEN, "Access denied."))
    }
}

/// `GET /api/ip-history`
async fn history_list_handler(State(state): State<StoreState>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_auth(&state, &headers) {
        return denied;
    }
    match storage::list_history(state.pool.as_ref()).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!("history list failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load history",
            )
        }
    }
}

/// `POST /api/ip-history`
async fn history_save_handler(
    State(state): State<StoreState>,
    headers: HeaderMap,
    Json(fields): Json<RecordFields>,
) -> Response {
    if let Err(denied) = require_auth(&state, &headers) {
        return denied;
    }
    if fields.ip.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "ip is required");
    }
    match storage::upsert_history(state.pool.as_ref(), &fields, Utc::now()).await {
        Ok(saved) => {
            let receipt = SaveReceipt {
                id: saved.id as u64,
                message: saved
                    .updated
                    .then(|| HISTORY_UPDATED_MESSAGE.to_string()),
            };
            let status = if saved.updated {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, Json(receipt)).into_response()
        }
        Err(e) => {
            error!("history save for {} failed: {e}", fields.ip);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save history")
        }
    }
}

/// `DELETE /api/ip-history`
async fn history_delete_handler(
    State(state): State<StoreState>,
    headers: HeaderMap,
    Json(request): Json<DeleteRequest>,
) -> Response {
    if let Err(denied) = require_auth(&state, &headers) {
        return denied;
    }
    if request.ids.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "ids must not be empty");
    }
    let ids: Vec<i64> = request
        .ids
        .iter()
        .filter_map(|&id| i64::try_from(id).ok())
        .collect();
    match storage::delete_history(state.pool.as_ref(), &ids).await {
        Ok(deleted) => {
            debug!("deleted {deleted} history rows");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!("history delete failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to delete history",
            )
        }
    }
}

/// `GET /api/ip-info`
async fn own_ip_info_handler(State(state): State<StoreState>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_auth(&state, &headers) {
        return denied;
    }
    proxy_geo_lookup(&state, None).await
}

/// `GET /api/ip-info/{ip}`
async fn ip_info_handler(
    State(state): State<StoreState>,
    headers: HeaderMap,
    Path(ip): Path<String>,
) -> Response {
    if let Err(denied) = require_auth(&state, &headers) {
        return denied;
    }
    if ip.parse::<IpAddr>().is_err() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid IP address");
    }
    proxy_geo_lookup(&state, Some(&ip)).await
}

/// Forwards a lookup to the geolocation provider.
///
/// Success passes the provider's JSON body through untouched, so fields
/// this crate does not model still reach the client. Provider error
/// statuses are forwarded as-is with whatever message the provider gave,
/// which keeps rate-limit responses (429) meaningful end to end.
async fn proxy_geo_lookup(state: &StoreState, ip: Option<&str>) -> Response {
    let url = match ip {
        Some(ip) => format!("{}/{}/json", state.geo_base, ip),
        None => format!("{}/json", state.geo_base),
    };
    let mut request = state.http.get(&url);
    if let Some(token) = &state.geo_token {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!("geolocation provider unreachable: {e}");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "geolocation provider unreachable",
            );
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = extract_api_message(&body)
            .unwrap_or_else(|| format!("geolocation provider returned status {status}"));
        return error_response(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            &message,
        );
    }

    match response.json::<serde_json::Value>().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("geolocation provider sent an unreadable body: {e}");
            error_response(
                StatusCode::BAD_GATEWAY,
                "geolocation provider returned an unreadable response",
            )
        }
    }
}
