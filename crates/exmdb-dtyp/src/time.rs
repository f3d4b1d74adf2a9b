//! NT time and floating time conversions (spec.md §3, §8 P4).
//!
//! NT time is a 64-bit count of 100 ns intervals since 1601-01-01 UTC.
//! Floating time is a 64-bit IEEE double counting days (with fractional
//! days as time-of-day) since 1899-12-30.

use time::OffsetDateTime;

/// Seconds between the NT epoch (1601-01-01) and the Unix epoch
/// (1970-01-01).
const NT_UNIX_EPOCH_DIFF_SECS: i64 = 11_644_473_600;

/// 100 ns ticks per second.
const NT_TICKS_PER_SEC: i64 = 10_000_000;

/// Converts a Unix timestamp (seconds since 1970-01-01 UTC) to NT time.
pub fn nt_time(unix_secs: i64) -> u64 {
    let nt_secs = unix_secs + NT_UNIX_EPOCH_DIFF_SECS;
    (nt_secs * NT_TICKS_PER_SEC) as u64
}

/// Converts NT time back to a Unix timestamp (seconds), truncating any
/// sub-second remainder the same way `nt_time` discards it on the way in.
pub fn nx_time(nt: u64) -> i64 {
    (nt as i64) / NT_TICKS_PER_SEC - NT_UNIX_EPOCH_DIFF_SECS
}

/// NT time for "now", per `CREATIONTIME`/`LASTMODIFICATIONTIME` in
/// `ExmdbQueries::create_folder`.
pub fn nt_now() -> u64 {
    nt_time(OffsetDateTime::now_utc().unix_timestamp())
}

/// Days between the floating-time epoch (1899-12-30) and the Unix epoch.
const FLOATING_UNIX_EPOCH_DIFF_DAYS: f64 = 25569.0;
const SECS_PER_DAY: f64 = 86400.0;

/// Converts a Unix timestamp to the floating-time representation used by
/// `PropvalType::FLOATING_TIME`.
pub fn floating_time(unix_secs: i64) -> f64 {
    unix_secs as f64 / SECS_PER_DAY + FLOATING_UNIX_EPOCH_DIFF_DAYS
}

/// Converts floating time back to a Unix timestamp (seconds).
pub fn unix_from_floating_time(value: f64) -> i64 {
    ((value - FLOATING_UNIX_EPOCH_DIFF_DAYS) * SECS_PER_DAY).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nt_time_round_trips_whole_seconds() {
        for t in [0i64, 1, 1_700_000_000, 4_000_000_000] {
            assert_eq!(nx_time(nt_time(t)), t, "round-trip failed for {t}");
        }
    }

    #[test]
    fn floating_time_round_trips() {
        for t in [0i64, 1_700_000_000] {
            let back = unix_from_floating_time(floating_time(t));
            assert_eq!(back, t);
        }
    }

    #[test]
    fn nt_now_is_after_nt_epoch() {
        assert!(nt_now() > 0);
    }
}
