//! Table rows and number formatting for the terminal

use tabled::{settings::Style, Table, Tabled};

use crate::filter::FilterOptions;
use crate::ledger::InvoiceRecord;
use crate::summary::{GroupValue, Kpis, PeriodTrend, SummaryRow};

#[derive(Tabled)]
pub struct ClientRow {
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "CHARGED")]
    charged: String,
    #[tabled(rename = "PAID BROKER")]
    paid: String,
    #[tabled(rename = "GROSS PROFIT")]
    gross: String,
    #[tabled(rename = "MARGIN")]
    margin: String,
}

#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "PROJECT")]
    project: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "CHARGED")]
    charged: String,
    #[tabled(rename = "PAID BROKER")]
    paid: String,
    #[tabled(rename = "GROSS PROFIT")]
    gross: String,
    #[tabled(rename = "MARGIN")]
    margin: String,
}

#[derive(Tabled)]
pub struct PeriodRow {
    #[tabled(rename = "PERIOD")]
    period: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "CHARGED")]
    charged: String,
    #[tabled(rename = "GROSS PROFIT")]
    gross: String,
    #[tabled(rename = "MARGIN")]
    margin: String,
    #[tabled(rename = "CHARGED Δ")]
    charged_change: String,
    #[tabled(rename = "PROFIT Δ")]
    gross_change: String,
}

#[derive(Tabled)]
pub struct BrokerRow {
    #[tabled(rename = "BROKER")]
    broker: String,
    #[tabled(rename = "SERVICES")]
    services: usize,
    #[tabled(rename = "PAID")]
    paid: String,
    #[tabled(rename = "CHARGED")]
    charged: String,
}

#[derive(Tabled)]
pub struct RecordRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "INVOICE")]
    invoice: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "PROJECT")]
    project: String,
    #[tabled(rename = "HOURS/TRIPS")]
    hours: String,
    #[tabled(rename = "UNIT COST")]
    unit_cost: String,
    #[tabled(rename = "CHARGED")]
    charged: String,
    #[tabled(rename = "PAID BROKER")]
    paid: String,
    #[tabled(rename = "GROSS PROFIT")]
    gross: String,
    #[tabled(rename = "MARGIN")]
    margin: String,
    #[tabled(rename = "BROKER")]
    broker: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "METRIC")]
    label: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_money(value: Option<f64>, symbol: &str) -> String {
    value.map(|v| format_money(v, symbol)).unwrap_or_default()
}

fn change(value: Option<f64>) -> String {
    value.map(|v| format!("{v:+.2}%")).unwrap_or_default()
}

pub fn client_rows(rows: &[SummaryRow], symbol: &str) -> Vec<ClientRow> {
    rows.iter()
        .map(|r| ClientRow {
            client: r.key.name().to_string(),
            invoices: r.invoice_count,
            charged: format_money(r.total_charged, symbol),
            paid: format_money(r.total_paid_broker, symbol),
            gross: format_money(r.gross_profit, symbol),
            margin: format_pct(r.margin_pct),
        })
        .collect()
}

pub fn project_rows(rows: &[SummaryRow], symbol: &str) -> Vec<ProjectRow> {
    rows.iter()
        .filter_map(|r| match &r.key {
            GroupValue::ClientProject { client, project } => Some(ProjectRow {
                client: client.clone(),
                project: project.clone(),
                invoices: r.invoice_count,
                charged: format_money(r.total_charged, symbol),
                paid: format_money(r.total_paid_broker, symbol),
                gross: format_money(r.gross_profit, symbol),
                margin: format_pct(r.margin_pct),
            }),
            _ => None,
        })
        .collect()
}

pub fn period_rows(rows: &[SummaryRow], trend: &[PeriodTrend], symbol: &str) -> Vec<PeriodRow> {
    rows.iter()
        .map(|r| {
            let t = trend.iter().find(|t| t.period == r.key.name());
            PeriodRow {
                period: r.key.name().to_string(),
                invoices: r.invoice_count,
                charged: format_money(r.total_charged, symbol),
                gross: format_money(r.gross_profit, symbol),
                margin: format_pct(r.margin_pct),
                charged_change: change(t.and_then(|t| t.charged_change_pct)),
                gross_change: change(t.and_then(|t| t.gross_profit_change_pct)),
            }
        })
        .collect()
}

pub fn broker_rows(rows: &[SummaryRow], symbol: &str) -> Vec<BrokerRow> {
    rows.iter()
        .map(|r| BrokerRow {
            broker: r.key.name().to_string(),
            services: r.invoice_count,
            paid: format_money(r.total_paid_broker, symbol),
            charged: format_money(r.total_charged, symbol),
        })
        .collect()
}

pub fn record_rows(records: &[InvoiceRecord], symbol: &str) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            date: r.date.map(|d| d.to_string()).unwrap_or_default(),
            invoice: text(&r.invoice_id),
            client: text(&r.client),
            project: text(&r.project),
            hours: r.hours_or_trips.map(|h| format!("{h:.2}")).unwrap_or_default(),
            unit_cost: opt_money(r.unit_cost, symbol),
            charged: opt_money(r.amount_charged, symbol),
            paid: opt_money(r.amount_paid_to_broker, symbol),
            gross: format_money(r.display_gross_profit(), symbol),
            margin: format_pct(r.margin_pct()),
            broker: text(&r.broker),
        })
        .collect()
}

/// KPI cards as a two-column table
pub fn kpi_table(kpis: &Kpis, symbol: &str) -> String {
    let rows = vec![
        MetricRow {
            label: "Total charged",
            value: format_money(kpis.total_charged, symbol),
        },
        MetricRow {
            label: "Paid to brokers",
            value: format_money(kpis.total_paid_broker, symbol),
        },
        MetricRow {
            label: "Gross profit",
            value: format_money(kpis.gross_profit, symbol),
        },
        MetricRow {
            label: "Margin",
            value: format_pct(kpis.margin_pct),
        },
        MetricRow {
            label: "Invoices",
            value: kpis.invoice_count.to_string(),
        },
        MetricRow {
            label: "Clients",
            value: kpis.client_count.to_string(),
        },
    ];
    table(rows)
}

/// Selector values with the `all` sentinel first
pub fn options_text(options: &FilterOptions) -> String {
    let mut out = String::new();
    for (label, values) in [
        ("Clients", &options.clients),
        ("Periods", &options.periods),
        ("Brokers", &options.brokers),
    ] {
        out.push_str(label);
        out.push_str(":\n  all\n");
        for v in values {
            out.push_str("  ");
            out.push_str(v);
            out.push('\n');
        }
    }
    out
}

pub fn table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Money with two decimals and thousands separators, e.g. `-$1,234.50`
pub fn format_money(value: f64, currency_symbol: &str) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = format_grouped_int(whole.parse::<i64>().unwrap_or(0));
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{sign}{currency_symbol}{grouped}.{frac}")
}

pub fn format_pct(value: f64) -> String {
    format!("{value:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped_int(0), "0");
        assert_eq!(format_grouped_int(1_250), "1,250");
        assert_eq!(format_grouped_int(-1_234_567), "-1,234,567");
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(150.0, "$"), "$150.00");
        assert_eq!(format_money(1234.5, "$"), "$1,234.50");
        assert_eq!(format_money(-1234.5, "$"), "-$1,234.50");
        assert_eq!(format_money(-0.001, "$"), "$0.00");
        assert_eq!(format_money(2_000_000.0, "€"), "€2,000,000.00");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_pct(66.666_666), "66.67%");
        assert_eq!(format_pct(0.0), "0.00%");
    }

    #[test]
    fn options_list_starts_with_sentinel() {
        let options = FilterOptions {
            clients: vec!["A".into()],
            periods: vec!["2024-02".into(), "2024-01".into()],
            brokers: vec![],
        };
        let text = options_text(&options);
        assert!(text.starts_with("Clients:\n  all\n  A\n"));
        assert!(text.contains("Periods:\n  all\n  2024-02\n  2024-01\n"));
    }

    #[test]
    fn empty_tables_render() {
        let rendered = table(client_rows(&[], "$"));
        assert!(rendered.contains("CLIENT"));
    }
}
