//! Time and rate formatting helpers

use std::time::Duration;

/// Format a latency given in microseconds
///
/// # Examples
///
/// ```
/// use kvpulse::util::time::format_micros;
///
/// assert_eq!(format_micros(500.0), "500.00us");
/// assert_eq!(format_micros(2_500.0), "2.50ms");
/// assert_eq!(format_micros(3_000_000.0), "3.00s");
/// ```
pub fn format_micros(micros: f64) -> String {
    if micros < 1_000.0 {
        format!("{:.2}us", micros)
    } else if micros < 1_000_000.0 {
        format!("{:.2}ms", micros / 1_000.0)
    } else {
        format!("{:.2}s", micros / 1_000_000.0)
    }
}

/// Format a rate (operations per second)
///
/// # Examples
///
/// ```
/// use kvpulse::util::time::format_rate;
///
/// assert_eq!(format_rate(500.0), "500");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.0}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else {
        format!("{:.2}M", rate / 1_000_000.0)
    }
}

/// Operations per second over `duration`, zero for an empty interval
pub fn ops_per_sec(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_micros() {
        assert_eq!(format_micros(0.5), "0.50us");
        assert_eq!(format_micros(1_500.0), "1.50ms");
        assert_eq!(format_micros(1_500_000.0), "1.50s");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(999.0), "999");
        assert_eq!(format_rate(1_500.0), "1.50K");
        assert_eq!(format_rate(1_500_000.0), "1.50M");
    }

    #[test]
    fn test_ops_per_sec() {
        assert_eq!(ops_per_sec(1000, Duration::from_secs(10)), 100.0);
        assert_eq!(ops_per_sec(1000, Duration::ZERO), 0.0);
    }
}
