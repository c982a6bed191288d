//! Core data model: record identity, history records, and wire types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::UNKNOWN_FIELD;

/// Identity of a history record.
///
/// A record minted locally by an optimistic insert starts life with a
/// `Placeholder` identifier; once the history store confirms the write,
/// the record is promoted to the store's `Durable` identifier. The two
/// spaces never overlap, so code that needs server-assigned identity
/// (selection, bulk deletion) can match on the variant instead of
/// guessing from the magnitude of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    /// Identifier assigned by the history store.
    Durable(u64),
    /// Locally minted identifier for a record the store has not confirmed.
    Placeholder(u64),
}

impl RecordId {
    /// True if the identifier was assigned by the history store.
    pub fn is_durable(&self) -> bool {
        matches!(self, RecordId::Durable(_))
    }

    /// True if the identifier is a local placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, RecordId::Placeholder(_))
    }

    /// The store-assigned value, if this identifier is durable.
    pub fn as_durable(&self) -> Option<u64> {
        match self {
            RecordId::Durable(id) => Some(*id),
            RecordId::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Durable(id) => write!(f, "{id}"),
            RecordId::Placeholder(n) => write!(f, "pending-{n}"),
        }
    }
}

/// One entry in the lookup history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Current identity; changes exactly once, placeholder to durable.
    pub id: RecordId,
    /// The looked-up IP address. Unique across the history.
    pub ip: String,
    /// City name, or `"Unknown"`.
    pub city: String,
    /// Region or state name, or `"Unknown"`.
    pub region: String,
    /// Country code, or `"Unknown"`.
    pub country: String,
    /// Latitude/longitude pair as returned by the lookup service.
    pub loc: Option<String>,
    /// When the record first entered the history.
    pub created_at: DateTime<Utc>,
    /// When the record was last refreshed by a repeat lookup.
    pub updated_at: DateTime<Utc>,
}

/// Geolocation fields bound for the history, normalized for storage.
///
/// Built from an [`IpInfo`] lookup result; absent fields are filled with
/// `"Unknown"` so the history never stores empty display columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    /// The looked-up IP address.
    pub ip: String,
    /// City name, or `"Unknown"`.
    pub city: String,
    /// Region or state name, or `"Unknown"`.
    pub region: String,
    /// Country code, or `"Unknown"`.
    pub country: String,
    /// Latitude/longitude pair, if the lookup returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

impl From<&IpInfo> for RecordFields {
    fn from(info: &IpInfo) -> Self {
        let or_unknown = |field: &Option<String>| {
            field
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(UNKNOWN_FIELD)
                .to_string()
        };
        RecordFields {
            ip: info.ip.clone(),
            city: or_unknown(&info.city),
            region: or_unknown(&info.region),
            country: or_unknown(&info.country),
            loc: info.loc.clone(),
        }
    }
}

/// Geolocation data as returned by the lookup service.
///
/// Every field except `ip` is optional; the client validates `ip` itself
/// rather than trusting the service to always include it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpInfo {
    /// The IP address the data describes.
    #[serde(default)]
    pub ip: String,
    /// City name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Region or state name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Latitude/longitude pair, `"lat,lon"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    /// Owning organization (ASN and name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    /// IANA timezone name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl From<&HistoryRecord> for IpInfo {
    /// Rebuilds displayable info from a cached record.
    ///
    /// The history only stores the core location fields, so `org`,
    /// `postal`, and `timezone` come back empty.
    fn from(record: &HistoryRecord) -> Self {
        IpInfo {
            ip: record.ip.clone(),
            city: Some(record.city.clone()),
            region: Some(record.region.clone()),
            country: Some(record.country.clone()),
            loc: record.loc.clone(),
            org: None,
            postal: None,
            timezone: None,
        }
    }
}

/// A stored record as the history store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Store-assigned identifier.
    pub id: u64,
    /// The looked-up IP address.
    pub ip: String,
    /// City name.
    pub city: String,
    /// Region or state name.
    pub region: String,
    /// Country code.
    pub country: String,
    /// Latitude/longitude pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    /// When the store first saw this IP.
    pub created_at: DateTime<Utc>,
    /// When the store last refreshed this IP.
    pub updated_at: DateTime<Utc>,
}

impl From<RemoteRecord> for HistoryRecord {
    fn from(remote: RemoteRecord) -> Self {
        HistoryRecord {
            id: RecordId::Durable(remote.id),
            ip: remote.ip,
            city: remote.city,
            region: remote.region,
            country: remote.country,
            loc: remote.loc,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
        }
    }
}

/// Receipt the history store returns for a create-or-update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Durable identifier of the saved record.
    pub id: u64,
    /// Present when the save updated an existing entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for a bulk delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Durable identifiers of the records to delete.
    pub ids: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> IpInfo {
        IpInfo {
            ip: "8.8.8.8".to_string(),
            city: Some("Mountain View".to_string()),
            region: Some("California".to_string()),
            country: Some("US".to_string()),
            loc: Some("37.4056,-122.0775".to_string()),
            org: Some("AS15169 Google LLC".to_string()),
            postal: Some("94043".to_string()),
            timezone: Some("America/Los_Angeles".to_string()),
        }
    }

    #[test]
    fn record_id_variant_helpers() {
        let durable = RecordId::Durable(42);
        let placeholder = RecordId::Placeholder(3);
        assert!(durable.is_durable());
        assert!(!durable.is_placeholder());
        assert_eq!(durable.as_durable(), Some(42));
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.as_durable(), None);
    }

    #[test]
    fn record_id_display_distinguishes_variants() {
        assert_eq!(RecordId::Durable(42).to_string(), "42");
        assert_eq!(RecordId::Placeholder(3).to_string(), "pending-3");
    }

    #[test]
    fn record_fields_copies_known_values() {
        let fields = RecordFields::from(&sample_info());
        assert_eq!(fields.ip, "8.8.8.8");
        assert_eq!(fields.city, "Mountain View");
        assert_eq!(fields.region, "California");
        assert_eq!(fields.country, "US");
        assert_eq!(fields.loc.as_deref(), Some("37.4056,-122.0775"));
    }

    #[test]
    fn record_fields_fills_missing_values_with_unknown() {
        let info = IpInfo {
            ip: "203.0.113.9".to_string(),
            city: None,
            region: Some("   ".to_string()),
            country: None,
            loc: None,
            org: None,
            postal: None,
            timezone: None,
        };
        let fields = RecordFields::from(&info);
        assert_eq!(fields.city, UNKNOWN_FIELD);
        assert_eq!(fields.region, UNKNOWN_FIELD);
        assert_eq!(fields.country, UNKNOWN_FIELD);
        assert_eq!(fields.loc, None);
    }

    #[test]
    fn ip_info_tolerates_missing_ip_at_decode_time() {
        let info: IpInfo = serde_json::from_str(r#"{"city": "Nowhere"}"#).unwrap();
        assert!(info.ip.is_empty());
        assert_eq!(info.city.as_deref(), Some("Nowhere"));
    }

    #[test]
    fn remote_record_becomes_durable_history_record() {
        let remote: RemoteRecord = serde_json::from_str(
            r#"{
                "id": 7,
                "ip": "1.1.1.1",
                "city": "Sydney",
                "region": "New South Wales",
                "country": "AU",
                "loc": "-33.8688,151.2093",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-02T11:30:00Z"
            }"#,
        )
        .unwrap();
        let record = HistoryRecord::from(remote);
        assert_eq!(record.id, RecordId::Durable(7));
        assert_eq!(record.ip, "1.1.1.1");
        assert_eq!(record.city, "Sydney");
        assert!(record.updated_at > record.created_at);
    }

    #[test]
    fn cached_record_rebuilds_partial_info() {
        let remote: RemoteRecord = serde_json::from_str(
            r#"{
                "id": 7,
                "ip": "1.1.1.1",
                "city": "Sydney",
                "region": "New South Wales",
                "country": "AU",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        let info = IpInfo::from(&HistoryRecord::from(remote));
        assert_eq!(info.ip, "1.1.1.1");
        assert_eq!(info.city.as_deref(), Some("Sydney"));
        assert_eq!(info.loc, None);
        assert_eq!(info.org, None);
        assert_eq!(info.timezone, None);
    }
}
