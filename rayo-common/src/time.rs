//! Timezone helpers
//!
//! All timestamps are stored as UTC RFC 3339 strings. The frontend renders
//! times in IST (UTC+05:30), so serialization converts on the way out.

use chrono::{DateTime, FixedOffset, Utc};

/// IST offset from UTC in seconds (+05:30)
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Convert a UTC timestamp to IST
pub fn to_ist(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(IST_OFFSET_SECS).expect("valid IST offset");
    ts.with_timezone(&offset)
}

/// Serialize a UTC timestamp as an IST ISO-8601 string
pub fn ist_string(ts: DateTime<Utc>) -> String {
    to_ist(ts).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ist_conversion() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let ist = to_ist(utc);
        assert_eq!(ist.to_rfc3339(), "2024-01-15T15:30:00+05:30");
    }

    #[test]
    fn test_ist_string_keeps_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 15).unwrap();
        assert_eq!(ist_string(utc), "2024-06-01T14:00:15+05:30");
    }
}
