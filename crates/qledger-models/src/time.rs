//! Epoch-millisecond helpers.
//!
//! Account timestamps are stored as milliseconds since the Unix epoch so
//! they survive the round trip through the remote profile store unchanged.

use chrono::{TimeZone, Utc};

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub const MILLIS_PER_HOUR: EpochMillis = 60 * 60 * 1000;
pub const MILLIS_PER_DAY: EpochMillis = 24 * MILLIS_PER_HOUR;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}

/// Format an epoch-millisecond timestamp as RFC 3339.
///
/// Out-of-range values fall back to the epoch itself.
pub fn to_rfc3339(millis: EpochMillis) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_to_rfc3339_epoch() {
        assert_eq!(to_rfc3339(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_day_and_hour_constants() {
        assert_eq!(MILLIS_PER_DAY, 86_400_000);
        assert_eq!(MILLIS_PER_HOUR * 24, MILLIS_PER_DAY);
    }
}
