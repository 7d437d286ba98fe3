//! Human-readable numbers and durations.

use std::time::Duration;

const SUFFIXES: [&str; 5] = ["K", "M", "G", "T", "P"];

/// Formats a counter, abbreviating past 999 with a decimal unit suffix.
///
/// ```
/// assert_eq!(flexbar::format::format_int(999), "999");
/// assert_eq!(flexbar::format::format_int(12_550), "13K");
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_int(n: u64) -> String {
    if n < 1000 {
        n.to_string()
    } else {
        format_float(n as f64)
    }
}

/// Formats a magnitude with a decimal unit suffix.
///
/// Precision shrinks as the mantissa grows: two decimals below 1, one below 10,
/// none otherwise.
#[must_use]
pub fn format_float(mut f: f64) -> String {
    let mut suffix = "";
    for s in SUFFIXES {
        if f < 1000.0 {
            break;
        }
        f /= 1000.0;
        suffix = s;
    }

    if f < 1.0 {
        format!("{f:.2}{suffix}")
    } else if f < 10.0 {
        format!("{f:.1}{suffix}")
    } else {
        format!("{f:.0}{suffix}")
    }
}

fn round_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_millis() >= 500 { secs.saturating_add(1) } else { secs }
}

/// Formats a duration rounded to whole seconds: `45s`, `2m05s`, `1h02m05s`.
#[must_use]
pub fn format_elapsed(d: Duration) -> String {
    let total = round_secs(d);
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);

    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats a duration as `HH:MM:SS`; hours are not wrapped into days.
#[must_use]
pub fn format_clock(d: Duration) -> String {
    let total = round_secs(d);
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{format_clock, format_elapsed, format_float, format_int};

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(0), "0");
        assert_eq!(format_int(100), "100");
        assert_eq!(format_int(1_000), "1.0K");
        assert_eq!(format_int(6_000), "6.0K");
        assert_eq!(format_int(12_550), "13K");
        assert_eq!(format_int(3_400_000), "3.4M");
        assert_eq!(format_int(u64::MAX), "18447P");
    }

    #[test]
    fn test_format_float_precision() {
        assert_eq!(format_float(0.5), "0.50");
        assert_eq!(format_float(7.26), "7.3");
        assert_eq!(format_float(42.0), "42");
        assert_eq!(format_float(1_500.0), "1.5K");
        assert_eq!(format_float(250_000.0), "250K");
    }

    #[test]
    fn test_format_durations() {
        assert_eq!(format_elapsed(Duration::ZERO), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(44_600)), "45s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "1h02m05s");

        assert_eq!(format_clock(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_clock(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_clock(Duration::from_secs(360_000)), "100:00:00");

        // Rounding up at the very top saturates instead of overflowing.
        assert!(format_clock(Duration::MAX).ends_with(":15"));
        assert!(format_elapsed(Duration::MAX).ends_with("15s"));
    }
}
