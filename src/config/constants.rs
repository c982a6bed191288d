//! Configuration constants.

/// Default base URL for the lookup service and history store.
///
/// Matches the bundled server's default bind address, so `ip_atlas serve`
/// and the client work together out of the box.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the geolocation lookup endpoint.
pub const IP_INFO_PATH: &str = "/api/ip-info";

/// Path of the history store endpoint.
pub const IP_HISTORY_PATH: &str = "/api/ip-history";

/// Per-request HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// TCP connection timeout in seconds.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// User-Agent header sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = concat!("ip_atlas/", env!("CARGO_PKG_VERSION"));

/// Value stored for geolocation fields the lookup service did not return.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Message the history store sends when a save updated an existing entry
/// instead of creating a new one.
pub const HISTORY_UPDATED_MESSAGE: &str = "History updated";

/// Status code the upstream services use for forbidden requests.
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// Status code the upstream services use for rate-limited requests.
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Default listen port for the bundled history store server.
pub const DEFAULT_SERVE_PORT: u16 = 8000;

/// Default SQLite database path for the bundled history store server.
pub const DEFAULT_DB_PATH: &str = "./ip_atlas.db";

/// Default geolocation provider the bundled server proxies lookups to.
pub const DEFAULT_GEO_BASE: &str = "https://ipinfo.io";

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "IP_ATLAS_BASE_URL";

/// Environment variable holding the API bearer token.
pub const ENV_TOKEN: &str = "IP_ATLAS_TOKEN";
