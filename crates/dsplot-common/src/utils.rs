//! Shared formatting and numeric helpers.

use std::time::Duration;

/// Formats a bar annotation: no decimals for integral values, two decimals otherwise.
pub fn format_bar_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Truncates a label to a maximum number of characters with an ellipsis.
pub fn truncate_label(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Formats an elapsed duration as fractional seconds for the process-time header.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.6}", elapsed.as_secs_f64())
}

/// Returns the minimum and maximum of the finite values, or `None` if there are none.
pub fn finite_bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bar_value() {
        assert_eq!(format_bar_value(5.0), "5");
        assert_eq!(format_bar_value(-3.0), "-3");
        assert_eq!(format_bar_value(2.5), "2.50");
        assert_eq!(format_bar_value(1.234), "1.23");
        assert_eq!(format_bar_value(7.001), "7.00");
        assert_eq!(format_bar_value(1e20), "100000000000000000000");
    }

    #[test]
    fn test_truncate_label() {
        let input = "This is a very long label that should be truncated";
        assert_eq!(truncate_label(input, 20), "This is a very lo...");
        assert_eq!(truncate_label("Short", 20), "Short");
        assert_eq!(truncate_label("ёжикёжикёжик", 6), "ёжи...");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.500000");
        assert_eq!(format_elapsed(Duration::ZERO), "0.000000");
    }

    #[test]
    fn test_finite_bounds() {
        assert_eq!(finite_bounds([3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(finite_bounds([f64::NAN, 2.0]), Some((2.0, 2.0)));
        assert_eq!(finite_bounds(std::iter::empty()), None);
    }
}
