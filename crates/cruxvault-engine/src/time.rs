//! Timestamp formatting shared by the working store and the VCE.

use chrono::{DateTime, Utc};

/// Current UTC time, to second precision, as it is stored in every
/// `created_at`/`updated_at`/`timestamp` column.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn to_storage(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn from_storage(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
