//! Row-level derived fields. Every function here is total: missing inputs
//! produce missing outputs, and ratios never divide by a non-positive value.

use chrono::NaiveDate;

/// Percentage `numerator / denominator * 100`, or exactly 0 when the
/// denominator is not positive.
pub fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Month bucket `YYYY-MM` of a date
pub fn period_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Whether `value` is a well-formed `YYYY-MM` month
pub fn is_period(value: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_ok() && value.len() == 7
}

/// Period from the invoice date, falling back to an explicit period column
pub fn resolve_period(date: Option<NaiveDate>, explicit: Option<&str>) -> Option<String> {
    match date {
        Some(d) => Some(period_of(d)),
        None => explicit
            .map(str::trim)
            .filter(|p| is_period(p))
            .map(str::to_string),
    }
}

pub fn gross_profit(charged: Option<f64>, paid: Option<f64>) -> Option<f64> {
    Some(charged? - paid?)
}

/// Margin of a row or group; 0 unless both figures exist and charged > 0
pub fn margin_pct(gross_profit: Option<f64>, charged: Option<f64>) -> f64 {
    match (gross_profit, charged) {
        (Some(gross), Some(charged)) => ratio_pct(gross, charged),
        _ => 0.0,
    }
}
