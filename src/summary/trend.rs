use serde::Serialize;

use super::aggregate::{GroupValue, SummaryRow};
use crate::ledger::derive;

/// Change of one period against the period before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTrend {
    pub period: String,
    /// `None` for the first period
    pub charged_change_pct: Option<f64>,
    pub gross_profit_change_pct: Option<f64>,
}

/// Percent change between consecutive periods, in chronological order.
///
/// Rows keyed by anything other than a period are ignored. A previous
/// value of zero or below gives a change of 0.
pub fn period_trend(rows: &[SummaryRow]) -> Vec<PeriodTrend> {
    let mut periods: Vec<(&str, f64, f64)> = rows
        .iter()
        .filter_map(|row| match &row.key {
            GroupValue::Period { period } => {
                Some((period.as_str(), row.total_charged, row.gross_profit))
            }
            _ => None,
        })
        .collect();
    periods.sort_by(|a, b| a.0.cmp(b.0));

    let mut trend = Vec::with_capacity(periods.len());
    let mut previous: Option<(f64, f64)> = None;
    for (period, charged, gross) in periods {
        trend.push(PeriodTrend {
            period: period.to_string(),
            charged_change_pct: previous.map(|(c, _)| pct_change(c, charged)),
            gross_profit_change_pct: previous.map(|(_, g)| pct_change(g, gross)),
        });
        previous = Some((charged, gross));
    }
    trend
}

fn pct_change(previous: f64, current: f64) -> f64 {
    derive::ratio_pct(current - previous, previous)
}
