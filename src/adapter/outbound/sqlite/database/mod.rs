//! SQLite database modules.
//!
//! Connection management, schema definitions, and Diesel row types.

pub mod connection;
pub mod model;
pub mod schema;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Fixed-width RFC 3339 text, so string order matches time order.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp '{text}': {e}")))
}

/// Amounts are stored as signed 64-bit integers.
pub(crate) fn to_db_amount(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| Error::Parse(format!("amount {amount} exceeds storage range")))
}

pub(crate) fn to_db_signed(value: i128) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::Parse(format!("value {value} exceeds storage range")))
}

pub(crate) fn from_db_amount(amount: i64) -> Result<u64> {
    u64::try_from(amount).map_err(|_| Error::Parse(format!("negative stored amount {amount}")))
}

pub(crate) fn from_db_score(score: i32) -> Result<u8> {
    u8::try_from(score).map_err(|_| Error::Parse(format!("stored score {score} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexicographically() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        assert!(timestamp(a) < timestamp(b));
        assert_eq!(timestamp(a), "2026-01-02T03:04:05.000Z");
        assert_eq!(parse_timestamp(&timestamp(b)).unwrap(), b);
    }

    #[test]
    fn amounts_outside_storage_range_are_errors() {
        assert!(to_db_amount(u64::MAX).is_err());
        assert!(from_db_amount(-1).is_err());
        assert_eq!(from_db_amount(to_db_amount(5_000_000).unwrap()).unwrap(), 5_000_000);
    }
}
