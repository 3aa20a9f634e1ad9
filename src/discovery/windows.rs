//! Time-window generation for the discovery driver: splits `[start, now]`
//! into fixed-length windows, emitted oldest-first, the same eager
//! `Vec`-of-bounds shape the backfill date-chunker uses for its run-for
//! dates.

use chrono::{DateTime, Duration, Utc};

/// Splits `[start, end]` into consecutive `window_hours`-long windows,
/// oldest-first. A zero-length range (`start == end`) yields one
/// zero-length window rather than an empty list, matching the
/// `days_back = 0` boundary behavior.
pub fn generate_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_hours: i64,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if start >= end {
        return vec![(start, start)];
    }

    let window = Duration::hours(window_hours.max(1));
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let window_end = (cursor + window).min(end);
        windows.push((cursor, window_end));
        cursor = window_end;
    }
    windows
}

/// Halves every window in `windows` into two 12h-equivalent sub-windows,
/// used by the `windows_12h` conditional pass.
pub fn halve_windows(windows: &[(DateTime<Utc>, DateTime<Utc>)]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut halved = Vec::with_capacity(windows.len() * 2);
    for (start, end) in windows {
        let span = *end - *start;
        let midpoint = *start + span / 2;
        halved.push((*start, midpoint));
        halved.push((midpoint, *end));
    }
    halved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(hour * 3600, 0).unwrap()
    }

    #[test]
    fn splits_into_equal_windows_oldest_first() {
        let windows = generate_windows(at(0), at(48), 24);
        assert_eq!(windows, vec![(at(0), at(24)), (at(24), at(48))]);
    }

    #[test]
    fn zero_length_range_yields_one_zero_length_window() {
        let windows = generate_windows(at(10), at(10), 24);
        assert_eq!(windows, vec![(at(10), at(10))]);
    }

    #[test]
    fn trailing_partial_window_is_clamped_to_end() {
        let windows = generate_windows(at(0), at(30), 24);
        assert_eq!(windows, vec![(at(0), at(24)), (at(24), at(30))]);
    }

    #[test]
    fn halving_doubles_window_count() {
        let windows = generate_windows(at(0), at(48), 24);
        let halved = halve_windows(&windows);
        assert_eq!(halved.len(), 4);
        assert_eq!(halved[0], (at(0), at(12)));
        assert_eq!(halved[1], (at(12), at(24)));
    }
}
