// Shared test helpers for mock-server setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use ip_atlas::{Config, LookupSession};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Creates a client config pointed at the given base URL.
/// Short timeout keeps failure-path tests fast.
#[allow(dead_code)] // Used by other test files
pub fn test_config(base_url: &str) -> Config {
    Config {
        base_url: base_url.to_string(),
        token: None,
        timeout_seconds: 5,
        user_agent: "ip_atlas_test/1.0".to_string(),
    }
}

/// Creates a session wired to a wiremock server.
#[allow(dead_code)] // Used by other test files
pub fn session_for(server: &MockServer) -> LookupSession {
    LookupSession::new(&test_config(&server.uri())).expect("Failed to build session")
}

/// Builds a geolocation response body like the one the store proxies through.
#[allow(dead_code)] // Used by other test files
pub fn geo_json(ip: &str, city: &str, region: &str, country: &str) -> Value {
    json!({
        "ip": ip,
        "city": city,
        "region": region,
        "country": country,
        "loc": "37.3860,-122.0838",
    })
}

/// Builds a stored history record as the store serializes it.
#[allow(dead_code)] // Used by other test files
pub fn stored_record_json(id: u64, ip: &str, city: &str) -> Value {
    json!({
        "id": id,
        "ip": ip,
        "city": city,
        "region": "California",
        "country": "US",
        "loc": null,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z",
    })
}
