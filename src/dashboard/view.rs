use serde::{Serialize, Serializer};
use std::cmp::Reverse;

use super::Snapshot;
use crate::filter::FilterState;
use crate::ledger::InvoiceRecord;
use crate::summary::{aggregate, period_trend, GroupKey, Kpis, PeriodTrend, SummaryRow};

/// Everything the dashboard shows for one filter state
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters: FilterState,
    pub kpis: Kpis,
    pub clients: Vec<SummaryRow>,
    pub projects: Vec<SummaryRow>,
    pub periods: Vec<SummaryRow>,
    pub trend: Vec<PeriodTrend>,
    pub brokers: Vec<SummaryRow>,
    /// Filtered detail rows, newest first; undated rows last
    #[serde(serialize_with = "serialize_details")]
    pub records: Vec<InvoiceRecord>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn serialize_details<S: Serializer>(
    records: &[InvoiceRecord],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(records.iter().map(InvoiceRecord::detail))
}

/// Filter the snapshot, then recompute every summary from the filtered rows
pub fn render(snapshot: &Snapshot, filters: &FilterState) -> DashboardView {
    let filtered = filters.apply(snapshot.records());

    let periods = aggregate(filtered.iter().copied(), GroupKey::Period);
    let trend = period_trend(&periods);

    let mut records: Vec<InvoiceRecord> = filtered.iter().map(|r| (*r).clone()).collect();
    records.sort_by_key(|r| Reverse(r.date));

    DashboardView {
        filters: filters.clone(),
        kpis: Kpis::compute(filtered.iter().copied()),
        clients: aggregate(filtered.iter().copied(), GroupKey::Client),
        projects: aggregate(filtered.iter().copied(), GroupKey::ClientProject),
        periods,
        trend,
        brokers: aggregate(filtered.iter().copied(), GroupKey::Broker),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        client: &str,
        broker: &str,
        date: (i32, u32, u32),
        charged: f64,
        paid: f64,
    ) -> InvoiceRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2);
        InvoiceRecord {
            date,
            invoice_id: Some(format!("{client}-{charged}")),
            client: Some(client.to_string()),
            project: Some(format!("{client} obra")),
            broker: Some(broker.to_string()),
            amount_charged: Some(charged),
            amount_paid_to_broker: Some(paid),
            period: date.map(crate::ledger::derive::period_of),
            ..Default::default()
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::from_records(vec![
            record("A", "X", (2024, 1, 10), 100.0, 40.0),
            record("A", "Y", (2024, 2, 3), 50.0, 10.0),
            record("B", "X", (2024, 2, 20), 0.0, 0.0),
        ])
    }

    #[test]
    fn unfiltered_view_covers_everything() {
        let view = render(&snapshot(), &FilterState::default());
        assert_eq!(view.records.len(), 3);
        assert_eq!(view.clients.len(), 2);
        assert_eq!(view.projects.len(), 2);
        assert_eq!(view.periods.len(), 2);
        assert_eq!(view.brokers.len(), 2);
        assert_eq!(view.kpis.total_charged, 150.0);
        assert_eq!(view.trend.len(), 2);
    }

    #[test]
    fn summaries_follow_filter_state() {
        let filters = FilterState::from_selections(None, None, Some("X"));
        let view = render(&snapshot(), &filters);
        assert_eq!(view.records.len(), 2);
        assert_eq!(view.kpis.total_charged, 100.0);
        assert_eq!(view.brokers.len(), 1);
        let clients: Vec<&str> = view.clients.iter().map(|r| r.key.name()).collect();
        assert_eq!(clients, vec!["A", "B"]);
    }

    #[test]
    fn serialized_records_carry_margin() {
        let view = render(&snapshot(), &FilterState::default());
        let json = serde_json::to_value(&view).unwrap();
        let oldest = &json["records"][2];
        assert_eq!(oldest["client"], "A");
        assert_eq!(oldest["gross_profit"], 60.0);
        assert_eq!(oldest["margin_pct"], 60.0);
    }

    #[test]
    fn records_are_newest_first() {
        let view = render(&snapshot(), &FilterState::default());
        let dates: Vec<String> = view
            .records
            .iter()
            .map(|r| r.date.unwrap().to_string())
            .collect();
        assert_eq!(dates, vec!["2024-02-20", "2024-02-03", "2024-01-10"]);
    }

    #[test]
    fn unmatched_period_gives_empty_view_and_zero_kpis() {
        let filters = FilterState::from_selections(None, Some("2024-01-x"), None);
        let view = render(&snapshot(), &filters);
        assert!(view.is_empty());
        assert!(view.clients.is_empty());
        assert!(view.trend.is_empty());
        assert_eq!(view.kpis, Kpis::default());

        let filters = FilterState::from_selections(None, Some("2023-01"), None);
        assert!(render(&snapshot(), &filters).is_empty());
    }

    #[test]
    fn unmatched_client_gives_empty_summaries() {
        let filters = FilterState::from_selections(Some("Z"), None, None);
        let view = render(&snapshot(), &filters);
        assert!(view.clients.is_empty());
        assert!(view.projects.is_empty());
        assert!(view.brokers.is_empty());
    }

    #[test]
    fn view_serializes_with_flattened_keys() {
        let view = render(&snapshot(), &FilterState::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["clients"][0]["dimension"], "client");
        assert_eq!(json["clients"][0]["client"], "A");
        assert_eq!(json["projects"][0]["project"], "A obra");
    }
}
