use serde::Serialize;
use std::collections::HashSet;

use crate::ledger::{derive, InvoiceRecord};

/// Headline figures for a record set
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Kpis {
    /// Sums rows with both amounts present, like [`SummaryRow`](super::SummaryRow)
    pub total_charged: f64,
    pub total_paid_broker: f64,
    pub gross_profit: f64,
    pub margin_pct: f64,
    pub invoice_count: usize,
    pub client_count: usize,
    pub record_count: usize,
}

impl Kpis {
    /// An empty input gives all-zero figures
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InvoiceRecord>,
    {
        let mut kpis = Kpis::default();
        let mut invoices = HashSet::new();
        let mut clients = HashSet::new();

        for record in records {
            kpis.record_count += 1;
            if let Some(id) = &record.invoice_id {
                invoices.insert(id.as_str());
            }
            if let Some(client) = &record.client {
                clients.insert(client.as_str());
            }
            if let Some((charged, paid)) = record.financials() {
                kpis.total_charged += charged;
                kpis.total_paid_broker += paid;
                kpis.gross_profit += charged - paid;
            }
        }

        kpis.invoice_count = invoices.len();
        kpis.client_count = clients.len();
        kpis.margin_pct = derive::ratio_pct(kpis.gross_profit, kpis.total_charged);
        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_all_zero() {
        let records: Vec<InvoiceRecord> = Vec::new();
        assert_eq!(Kpis::compute(&records), Kpis::default());
    }

    #[test]
    fn totals_and_distinct_counts() {
        let records = vec![
            InvoiceRecord {
                client: Some("A".into()),
                invoice_id: Some("1".into()),
                amount_charged: Some(100.0),
                amount_paid_to_broker: Some(40.0),
                ..Default::default()
            },
            InvoiceRecord {
                client: Some("A".into()),
                invoice_id: Some("1".into()),
                amount_charged: Some(50.0),
                amount_paid_to_broker: Some(10.0),
                ..Default::default()
            },
            InvoiceRecord {
                client: Some("B".into()),
                invoice_id: Some("2".into()),
                amount_charged: Some(50.0),
                ..Default::default()
            },
        ];

        let kpis = Kpis::compute(&records);
        assert_eq!(kpis.record_count, 3);
        assert_eq!(kpis.invoice_count, 2);
        assert_eq!(kpis.client_count, 2);
        assert_eq!(kpis.total_charged, 150.0);
        assert_eq!(kpis.total_paid_broker, 50.0);
        assert_eq!(kpis.gross_profit, 100.0);
        assert!((kpis.margin_pct - 66.666_666).abs() < 1e-4);
    }
}
