use chrono::{NaiveTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;

use crate::text::normalize_text;

static KOREAN_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:오전|오후)\s*\d{1,2}:\d{2}$").unwrap());

static MERIDIEM_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])\.?\s*m\.?$").unwrap());

/// Render a chat timestamp in the `오전/오후 H:MM` form used by the export.
///
/// Already-Korean values are kept, `H:MM AM/PM` (hour 1-12) is converted,
/// anything else is returned normalized but otherwise untouched.
pub fn format_timestamp(raw: &str) -> String {
    let normalized = normalize_text(raw);

    if KOREAN_TIME_RE.is_match(&normalized) {
        return normalized;
    }

    if let Some(caps) = MERIDIEM_TIME_RE.captures(&normalized) {
        let candidate = format!(
            "{}:{} {}M",
            &caps[1],
            &caps[2],
            caps[3].to_ascii_uppercase()
        );
        if let Ok(time) = NaiveTime::parse_from_str(&candidate, "%I:%M %p") {
            let (is_pm, hour) = time.hour12();
            let meridiem = if is_pm { "오후" } else { "오전" };
            return format!("{meridiem} {hour}:{:02}", time.minute());
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meridiem_converted() {
        assert_eq!(format_timestamp("3:45 PM"), "오후 3:45");
        assert_eq!(format_timestamp(" 11:05am "), "오전 11:05");
        assert_eq!(format_timestamp("12:00 AM"), "오전 12:00");
        assert_eq!(format_timestamp("12:30 p.m."), "오후 12:30");
    }

    #[test]
    fn test_korean_kept() {
        assert_eq!(format_timestamp("오후  9:07"), "오후 9:07");
        assert_eq!(format_timestamp("오전 03:15"), "오전 03:15");
        assert_eq!(format_timestamp("오전\n11:40"), "오전 11:40");
    }

    #[test]
    fn test_out_of_range_hour_passes_through() {
        assert_eq!(format_timestamp("13:10 PM"), "13:10 PM");
        assert_eq!(format_timestamp("0:10 AM"), "0:10 AM");
    }

    #[test]
    fn test_other_values_pass_through_normalized() {
        assert_eq!(
            format_timestamp("March  12, 2024\n3:45PM"),
            "March 12, 2024 3:45PM"
        );
        assert_eq!(format_timestamp(""), "");
    }
}
