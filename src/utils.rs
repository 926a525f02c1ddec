use crate::error::{Result, SalesReportError};
use chrono::{Datelike, NaiveDate};

pub const ELLIPSIS: &str = "...";

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn first_day_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Parses a day/month/year date such as `18/10/2026`.
pub fn parse_day_month_year(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").map_err(|_| {
        SalesReportError::DateError(format!(
            "Invalid date '{}'. Expected DD/MM/YYYY",
            value
        ))
    })
}

/// Rounds half away from zero to a whole unit.
pub fn round_whole(value: f64) -> i64 {
    value.round() as i64
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `margin / turnover * 100` rounded to 2 places, `0` when turnover is zero.
pub fn margin_percent(margin: i64, turnover: i64) -> f64 {
    if turnover == 0 {
        return 0.0;
    }
    round_to(margin as f64 / turnover as f64 * 100.0, 2)
}

/// Formats an integer with comma thousands separators, e.g. `1,234,567`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Cuts `text` to `max_len` characters plus an ellipsis when it is longer than `max_len`.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let mut cropped: String = text.chars().take(max_len).collect();
        cropped.push_str(ELLIPSIS);
        cropped
    } else {
        text.to_string()
    }
}

/// Greedy word wrap on character counts. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let indent: String = text.chars().take_while(|c| *c == ' ').collect();
    let mut lines = Vec::new();
    let mut current = indent.clone();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let used = current.chars().count();
            let sep = usize::from(used > indent.len());
            if used + sep + word.len() <= max_chars {
                if sep == 1 {
                    current.push(' ');
                }
                current.extend(word.iter());
                break;
            }
            if used > indent.len() {
                lines.push(std::mem::replace(&mut current, indent.clone()));
                continue;
            }
            let room = max_chars.saturating_sub(used).max(1);
            let rest = word.split_off(room.min(word.len()));
            current.extend(word.iter());
            lines.push(std::mem::replace(&mut current, indent.clone()));
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }

    if current.chars().count() > indent.len() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_day_helpers() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(
            first_day_of_month(date),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
        assert_eq!(
            first_day_of_year(date),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_day_month_year() {
        assert_eq!(
            parse_day_month_year("05/03/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(parse_day_month_year("2024-03-05").is_err());
    }

    #[test]
    fn test_margin_percent_rounding_and_zero_guard() {
        assert_eq!(margin_percent(250, 1500), 16.67);
        assert_eq!(margin_percent(50, 0), 0.0);
        assert_eq!(margin_percent(-30, 200), -15.0);
    }

    #[test]
    fn test_round_whole_half_away_from_zero() {
        assert_eq!(round_whole(2.5), 3);
        assert_eq!(round_whole(-2.5), -3);
        assert_eq!(round_whole(1499.4), 1499);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1500), "1,500");
        assert_eq!(format_thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Pump", 10), "Pump");
        assert_eq!(truncate_text("0123456789", 10), "0123456789");
        assert_eq!(truncate_text("0123456789AB", 10), "0123456789...");
        assert_eq!(truncate_text("Čerpadlo vodní", 8), "Čerpadlo...");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short line", 40), vec!["short line"]);
        assert_eq!(
            wrap_text("Gross Margin is defined as selling price", 20),
            vec!["Gross Margin is", "defined as selling", "price"]
        );
        assert_eq!(wrap_text("  - indented text here", 12), vec!["  - indented", "  text here"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }
}
