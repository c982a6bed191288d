//! HTTP clients for the lookup service and the history store.
//!
//! Both services hang off one base URL and share auth, timeouts, and error
//! mapping, so they share an [`ApiContext`]. The context is an explicit
//! value threaded through every call; nothing here reads ambient global
//! state, which keeps concurrent sessions with different credentials
//! possible.

use log::debug;
use reqwest::{RequestBuilder, Response};
use url::Url;

use crate::config::{Config, HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS};
use crate::error_handling::{ApiError, InitializationError};
use crate::initialization::init_client;

pub mod history_store;
pub mod lookup;

/// Explicit request context for all API calls: base URL, HTTP client, and
/// the bearer credential (if the API requires one).
#[derive(Debug, Clone)]
pub struct ApiContext {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiContext {
    /// Builds a context from the client configuration.
    ///
    /// The base URL must parse as an absolute `http` or `https` URL; a
    /// trailing slash is tolerated and stripped.
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| InitializationError::BaseUrlError(format!("{}: {e}", config.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(InitializationError::BaseUrlError(format!(
                "{}: scheme must be http or https",
                config.base_url
            )));
        }
        let http = init_client(config)?;
        Ok(ApiContext {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(format!("{}{path}", self.base_url)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(format!("{}{path}", self.base_url)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.delete(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Sends a request, mapping transport failures to `NetworkFailure`.
pub(crate) async fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
    request.send().await.map_err(|e| {
        debug!("request to {endpoint} failed in transport: {e}");
        ApiError::NetworkFailure {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
            source: Some(e),
        }
    })
}

/// Maps non-success statuses into the error taxonomy.
///
/// 403 and 429 become `AccessDenied`; every other error status becomes
/// `NetworkFailure` with whatever detail the body offered.
pub(crate) async fn check_status(response: Response, endpoint: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = extract_api_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    if code == HTTP_STATUS_FORBIDDEN || code == HTTP_STATUS_TOO_MANY_REQUESTS {
        Err(ApiError::AccessDenied {
            endpoint: endpoint.to_string(),
            status: code,
            detail,
        })
    } else {
        Err(ApiError::NetworkFailure {
            endpoint: endpoint.to_string(),
            detail: format!("status {code}: {detail}"),
            source: None,
        })
    }
}

/// Pulls a human-readable message out of an API error body.
///
/// The services answer errors with either a bare JSON string or an object
/// carrying `error`, `message`, or `title` (checked in that order). Plain
/// text bodies are passed through as-is; empty bodies yield nothing.
pub(crate) fn extract_api_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(value) => ["error", "message", "title"].iter().find_map(|key| {
            value.get(key).map(|field| match field {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }),
        Err(_) => Some(trimmed.to_string()),
    }
}
