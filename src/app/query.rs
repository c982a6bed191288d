//! Lookup query validation and CLI target resolution.

use std::net::IpAddr;

use log::warn;

use crate::models::{HistoryRecord, RecordId};

/// Validates a lookup query as an IPv4 or IPv6 literal.
///
/// Returns the normalized textual form (IPv6 addresses compress, so
/// `2001:0db8::0001` becomes `2001:db8::1`), which keeps cache keys
/// consistent no matter how the user spelled the address. Logs a warning
/// and returns `None` for anything unparsable.
pub fn validate_ip_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        warn!("Skipping empty lookup query");
        return None;
    }
    match trimmed.parse::<IpAddr>() {
        Ok(addr) => Some(addr.to_string()),
        Err(_) => {
            warn!("Skipping invalid IP address: {trimmed}");
            None
        }
    }
}

/// Resolves a CLI deletion target to a cached record id.
///
/// A bare integer is treated as a durable record id; anything else is
/// treated as an IP address and matched against cached records. Logs a
/// warning and returns `None` when nothing matches.
pub fn resolve_selection_token(records: &[HistoryRecord], token: &str) -> Option<RecordId> {
    let trimmed = token.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        let id = RecordId::Durable(value);
        if records.iter().any(|record| record.id == id) {
            return Some(id);
        }
        warn!("No history record with id {value}");
        return None;
    }
    match trimmed.parse::<IpAddr>() {
        Ok(addr) => {
            let ip = addr.to_string();
            match records.iter().find(|record| record.ip == ip) {
                Some(record) => Some(record.id),
                None => {
                    warn!("No history record for {ip}");
                    None
                }
            }
        }
        Err(_) => {
            warn!("Skipping invalid deletion target (not an id or IP address): {trimmed}");
            None
        }
    }
}
