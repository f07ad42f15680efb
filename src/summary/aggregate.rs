use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::ledger::{derive, InvoiceRecord};

/// Dimension a summary is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Client,
    ClientProject,
    Period,
    Broker,
}

impl GroupKey {
    /// Key of `record` under this dimension; `None` when a component is missing
    pub fn value_of(self, record: &InvoiceRecord) -> Option<GroupValue> {
        match self {
            GroupKey::Client => Some(GroupValue::Client {
                client: record.client.clone()?,
            }),
            GroupKey::ClientProject => Some(GroupValue::ClientProject {
                client: record.client.clone()?,
                project: record.project.clone()?,
            }),
            GroupKey::Period => Some(GroupValue::Period {
                period: record.period.clone()?,
            }),
            GroupKey::Broker => Some(GroupValue::Broker {
                broker: record.broker.clone()?,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "dimension", rename_all = "snake_case")]
pub enum GroupValue {
    Client { client: String },
    ClientProject { client: String, project: String },
    Period { period: String },
    Broker { broker: String },
}

impl GroupValue {
    /// Innermost component: the project for client×project, otherwise the key itself
    pub fn name(&self) -> &str {
        match self {
            GroupValue::Client { client } => client,
            GroupValue::ClientProject { project, .. } => project,
            GroupValue::Period { period } => period,
            GroupValue::Broker { broker } => broker,
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::ClientProject { client, project } => write!(f, "{client} / {project}"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// One aggregated bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(flatten)]
    pub key: GroupValue,
    /// Distinct invoice ids in the group
    pub invoice_count: usize,
    /// Only rows with both amounts present; a charged row with no broker
    /// payment recorded is left out, so this can understate billing
    pub total_charged: f64,
    pub total_paid_broker: f64,
    pub gross_profit: f64,
    /// From the summed totals, not an average of row margins
    pub margin_pct: f64,
}

#[derive(Default)]
struct Bucket {
    invoices: HashSet<String>,
    charged: f64,
    paid: f64,
    gross: f64,
}

impl Bucket {
    fn add(&mut self, record: &InvoiceRecord) {
        if let Some(id) = &record.invoice_id {
            self.invoices.insert(id.clone());
        }
        // Rows with a missing amount stay out of every money sum so that
        // gross == charged - paid holds per group.
        if let Some((charged, paid)) = record.financials() {
            self.charged += charged;
            self.paid += paid;
            self.gross += charged - paid;
        }
    }

    fn into_row(self, key: GroupValue) -> SummaryRow {
        SummaryRow {
            key,
            invoice_count: self.invoices.len(),
            total_charged: self.charged,
            total_paid_broker: self.paid,
            gross_profit: self.gross,
            margin_pct: derive::ratio_pct(self.gross, self.charged),
        }
    }
}

/// Group `records` by `key`, one row per key present, ordered by key.
///
/// Records missing a key component are left out of that grouping only.
pub fn aggregate<'a, I>(records: I, key: GroupKey) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a InvoiceRecord>,
{
    let mut buckets: BTreeMap<GroupValue, Bucket> = BTreeMap::new();
    for record in records {
        if let Some(value) = key.value_of(record) {
            buckets.entry(value).or_default().add(record);
        }
    }

    buckets
        .into_iter()
        .map(|(value, bucket)| bucket.into_row(value))
        .collect()
}

/// Ranking metric for top-N tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalCharged,
    TotalPaidBroker,
    GrossProfit,
    MarginPct,
    InvoiceCount,
}

impl Metric {
    pub fn value(self, row: &SummaryRow) -> f64 {
        match self {
            Metric::TotalCharged => row.total_charged,
            Metric::TotalPaidBroker => row.total_paid_broker,
            Metric::GrossProfit => row.gross_profit,
            Metric::MarginPct => row.margin_pct,
            Metric::InvoiceCount => row.invoice_count as f64,
        }
    }
}

/// The `n` largest rows by `metric`, strictly descending.
///
/// Exact ties keep ascending key order. Margin rankings skip groups with
/// nothing charged, whose margin is 0 by definition rather than by result.
pub fn top_n(rows: &[SummaryRow], metric: Metric, n: usize) -> Vec<SummaryRow> {
    let mut ranked: Vec<SummaryRow> = rows
        .iter()
        .filter(|r| metric != Metric::MarginPct || r.total_charged > 0.0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        metric
            .value(b)
            .total_cmp(&metric.value(a))
            .then_with(|| a.key.cmp(&b.key))
    });
    ranked.truncate(n);
    ranked
}
