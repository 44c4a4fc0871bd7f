/// Record identities are system-assigned opaque strings (UUID v4 by default).
pub type RecordId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Document body: field name to JSON scalar.
pub type Fields = serde_json::Map<String, serde_json::Value>;
