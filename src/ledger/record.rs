use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::derive;

/// One invoice row as loaded from the source.
///
/// Every field except `extra` may be missing; coercion failures at load time
/// leave the field as `None` instead of rejecting the row.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InvoiceRecord {
    pub date: Option<NaiveDate>,
    /// Not unique across brokers; several rows may share one invoice
    pub invoice_id: Option<String>,
    pub client: Option<String>,
    pub project: Option<String>,
    pub broker: Option<String>,
    pub hours_or_trips: Option<f64>,
    pub unit_cost: Option<f64>,
    pub amount_charged: Option<f64>,
    pub amount_paid_to_broker: Option<f64>,
    /// `YYYY-MM`, derived at load time
    pub period: Option<String>,
    pub truck_id: Option<String>,
    pub truck_number: Option<String>,
    pub ticket: Option<String>,
    pub running_total: Option<f64>,
    /// Unmapped source columns, by header
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl InvoiceRecord {
    /// Charged minus paid, when both amounts are known
    pub fn gross_profit(&self) -> Option<f64> {
        derive::gross_profit(self.amount_charged, self.amount_paid_to_broker)
    }

    /// Gross profit with missing amounts read as zero. Display only.
    pub fn display_gross_profit(&self) -> f64 {
        self.amount_charged.unwrap_or(0.0) - self.amount_paid_to_broker.unwrap_or(0.0)
    }

    pub fn margin_pct(&self) -> f64 {
        derive::margin_pct(self.gross_profit(), self.amount_charged)
    }

    /// `(charged, paid)` when the row can take part in money sums
    pub fn financials(&self) -> Option<(f64, f64)> {
        Some((self.amount_charged?, self.amount_paid_to_broker?))
    }

    /// The row with its derived values, for JSON output
    pub fn detail(&self) -> RecordDetail<'_> {
        RecordDetail {
            record: self,
            gross_profit: self.gross_profit(),
            margin_pct: self.margin_pct(),
        }
    }
}

/// A record serialized together with gross profit and margin
#[derive(Debug, Serialize)]
pub struct RecordDetail<'a> {
    #[serde(flatten)]
    pub record: &'a InvoiceRecord,
    pub gross_profit: Option<f64>,
    pub margin_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(charged: Option<f64>, paid: Option<f64>) -> InvoiceRecord {
        InvoiceRecord {
            amount_charged: charged,
            amount_paid_to_broker: paid,
            ..Default::default()
        }
    }

    #[test]
    fn margin_follows_charged_amount() {
        let r = record(Some(100.0), Some(40.0));
        assert_eq!(r.gross_profit(), Some(60.0));
        assert!((r.margin_pct() - 60.0).abs() < 1e-9);

        let r = record(Some(0.0), Some(0.0));
        assert_eq!(r.margin_pct(), 0.0);

        let r = record(Some(-20.0), Some(5.0));
        assert_eq!(r.margin_pct(), 0.0);
    }

    #[test]
    fn missing_amounts_only_count_as_zero_for_display() {
        let r = record(Some(80.0), None);
        assert_eq!(r.gross_profit(), None);
        assert_eq!(r.display_gross_profit(), 80.0);
        assert_eq!(r.margin_pct(), 0.0);
        assert_eq!(r.financials(), None);
    }

    #[test]
    fn detail_carries_derived_values() {
        let json = serde_json::to_value(record(Some(100.0), Some(40.0)).detail()).unwrap();
        assert_eq!(json["amount_charged"], 100.0);
        assert_eq!(json["gross_profit"], 60.0);
        assert_eq!(json["margin_pct"], 60.0);

        let json = serde_json::to_value(record(Some(100.0), None).detail()).unwrap();
        assert!(json["gross_profit"].is_null());
        assert_eq!(json["margin_pct"], 0.0);
    }

    #[test]
    fn margin_is_never_nan() {
        for (c, p) in [
            (Some(0.0), Some(10.0)),
            (None, None),
            (Some(f64::MIN_POSITIVE), Some(0.0)),
        ] {
            assert!(!record(c, p).margin_pct().is_nan());
        }
    }
}
