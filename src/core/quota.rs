use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::QuotaStatus;

/// Resolve the quota day for an instant under a fixed UTC offset.
///
/// Quota rows are keyed by calendar day, so the day boundary decides when a
/// seeker's allowance resets. Hanap runs on a single national boundary
/// (UTC+8 by default) instead of per-seeker timezones; shifting the instant
/// by the offset and taking the date gives the same day key everywhere.
#[inline]
pub fn day_key(now: DateTime<Utc>, offset_hours: i64) -> NaiveDate {
    (now + Duration::hours(offset_hours)).date_naive()
}

/// Swipes left for the day, clamped at zero.
///
/// Consumed can exceed the limit when a tier downgrade lowers the limit
/// mid-day; the snapshot must never go negative because of it.
#[inline]
pub fn remaining(limit: i64, consumed: i64) -> i64 {
    (limit - consumed).max(0)
}

/// Build the quota snapshot returned with every feed page and swipe.
#[inline]
pub fn snapshot(limit: i64, consumed: i64) -> QuotaStatus {
    let remaining = remaining(limit, consumed);
    QuotaStatus {
        remaining,
        limit,
        can_swipe: remaining > 0,
    }
}

/// Fail-closed snapshot used when the quota store cannot be read.
///
/// An unreadable ledger must present as "no swipes left", never as
/// unlimited swipes.
#[inline]
pub fn exhausted(limit: i64) -> QuotaStatus {
    QuotaStatus {
        remaining: 0,
        limit,
        can_swipe: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_shifts_by_offset() {
        // 23:30 UTC on Jan 1 is already 07:30 on Jan 2 in Manila (UTC+8).
        let late_utc = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            day_key(late_utc, 8),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            day_key(late_utc, 0),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_day_key_rolls_over_at_local_midnight() {
        // 15:59 UTC = 23:59 UTC+8; one minute later the day key advances.
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 15, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap();

        assert_eq!(
            day_key(before, 8),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            day_key(after, 8),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        assert_eq!(remaining(10, 3), 7);
        assert_eq!(remaining(10, 10), 0);
        assert_eq!(remaining(10, 15), 0);
    }

    #[test]
    fn test_snapshot_can_swipe() {
        let open = snapshot(10, 9);
        assert_eq!(open.remaining, 1);
        assert!(open.can_swipe);

        let spent = snapshot(10, 10);
        assert_eq!(spent.remaining, 0);
        assert!(!spent.can_swipe);
    }

    #[test]
    fn test_exhausted_is_fail_closed() {
        let status = exhausted(20);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.limit, 20);
        assert!(!status.can_swipe);
    }
}
