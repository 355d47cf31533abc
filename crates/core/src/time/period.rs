use chrono::{DateTime, Datelike, NaiveDate};

// Pinned so chart labels do not depend on the host locale.
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodFormat {
    Month,
    Day,
}

fn detect_format(period: &str) -> Option<PeriodFormat> {
    let b = period.as_bytes();
    let digits = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);
    match b.len() {
        7 if digits(0..4) && b[4] == b'-' && digits(5..7) => Some(PeriodFormat::Month),
        10 if digits(0..4) && b[4] == b'-' && digits(5..7) && b[7] == b'-' && digits(8..10) => {
            Some(PeriodFormat::Day)
        }
        _ => None,
    }
}

/// Parses a period id (`YYYY-MM`, `YYYY-MM-DD` or an RFC 3339 timestamp) into a calendar date.
/// Month periods resolve to the first day of the month.
pub fn parse_period_date(period: &str) -> Option<NaiveDate> {
    let period = period.trim();
    match detect_format(period) {
        Some(PeriodFormat::Month) => {
            NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").ok()
        }
        Some(PeriodFormat::Day) => NaiveDate::parse_from_str(period, "%Y-%m-%d").ok(),
        None => DateTime::parse_from_rfc3339(period)
            .ok()
            .map(|dt| dt.date_naive()),
    }
}

/// Short chart-axis label: `2025-01` -> `Jan 2025`, `2025-01-15` -> `Jan 15, 2025`.
/// Anything else (including impossible dates) is returned unchanged.
pub fn format_period_date(period: &str) -> String {
    let Some(format) = detect_format(period) else {
        return period.to_string();
    };
    let Some(date) = parse_period_date(period) else {
        return period.to_string();
    };

    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    match format {
        PeriodFormat::Month => format!("{month} {}", date.year()),
        PeriodFormat::Day => format!("{month} {}, {}", date.day(), date.year()),
    }
}
