//! Equality filters over the loaded record set

use serde::Serialize;
use std::collections::BTreeSet;

use crate::ledger::InvoiceRecord;

/// Selector value meaning "no constraint"
pub const ALL: &str = "all";

/// Current selector values; `None` leaves a dimension unconstrained
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterState {
    pub client: Option<String>,
    pub period: Option<String>,
    pub broker: Option<String>,
}

impl FilterState {
    /// Build from raw selector values, where blank, `all` and `Todos` mean unset
    pub fn from_selections(
        client: Option<&str>,
        period: Option<&str>,
        broker: Option<&str>,
    ) -> Self {
        Self {
            client: selection(client),
            period: selection(period),
            broker: selection(broker),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.client.is_none() && self.period.is_none() && self.broker.is_none()
    }

    pub fn matches(&self, record: &InvoiceRecord) -> bool {
        field_matches(&self.client, &record.client)
            && field_matches(&self.period, &record.period)
            && field_matches(&self.broker, &record.broker)
    }

    /// Records matching every set predicate, in input order
    pub fn apply<'a>(&self, records: &'a [InvoiceRecord]) -> Vec<&'a InvoiceRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Normalize one selector value
pub fn selection(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) || value.eq_ignore_ascii_case("todos")
    {
        None
    } else {
        Some(value.to_string())
    }
}

fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.as_deref() == Some(w.as_str()),
    }
}

/// Distinct selector values present in a record set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOptions {
    /// Ascending
    pub clients: Vec<String>,
    /// Newest first
    pub periods: Vec<String>,
    /// Ascending
    pub brokers: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[InvoiceRecord]) -> Self {
        let mut clients = BTreeSet::new();
        let mut periods = BTreeSet::new();
        let mut brokers = BTreeSet::new();
        for r in records {
            if let Some(c) = &r.client {
                clients.insert(c.clone());
            }
            if let Some(p) = &r.period {
                periods.insert(p.clone());
            }
            if let Some(b) = &r.broker {
                brokers.insert(b.clone());
            }
        }
        Self {
            clients: clients.into_iter().collect(),
            periods: periods.into_iter().rev().collect(),
            brokers: brokers.into_iter().collect(),
        }
    }
}
