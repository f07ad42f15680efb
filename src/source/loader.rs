use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tracing::{debug, info};

use super::columns::{self, ColumnMap};
use super::{Cell, TabularSource};
use crate::error::Result;
use crate::ledger::{derive, InvoiceRecord};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Columns the loader reads into typed fields
const TYPED_COLUMNS: &[&str] = &[
    columns::FECHA,
    columns::FACTURA,
    columns::CAMION_ID,
    columns::BROKER,
    columns::CAMION_NUM,
    columns::TICKET,
    columns::CLIENTE,
    columns::PROYECTO,
    columns::PROYECTO_OK,
    columns::HORAS_VIAJE,
    columns::COSTO_UNITARIO,
    columns::TOTAL_COBRADO,
    columns::PAGO_BROKER,
    columns::ACUMULADO,
    columns::PERIODO,
];

/// Load one sheet of `source` into invoice records.
///
/// Header-echo rows and blank rows are dropped. A cell that fails coercion
/// becomes a missing value; only an unreadable source or sheet is an error.
pub fn load_records(
    source: &mut dyn TabularSource,
    sheet: &str,
    columns: &ColumnMap,
    discriminator: &str,
) -> Result<Vec<InvoiceRecord>> {
    let raw = source.read_sheet(sheet)?;

    let canonical: Vec<String> = raw.headers.iter().map(|h| columns.canonical(h)).collect();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, name) in canonical.iter().enumerate() {
        index.entry(name.as_str()).or_insert(i);
    }

    // Labels a duplicated header row would carry in the discriminator column
    let echo_labels: Vec<&str> = match index.get(discriminator) {
        Some(&i) => vec![discriminator, raw.headers[i].as_str()],
        None => vec![discriminator],
    };

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut blank = 0usize;
    let mut echoed = 0usize;

    for (row_idx, cells) in raw.rows.iter().enumerate() {
        if cells.iter().all(Cell::is_empty) {
            blank += 1;
            continue;
        }

        let row = Row {
            cells,
            index: &index,
            line: row_idx + 2,
        };

        if let Some(Cell::Text(value)) = row.cell(discriminator) {
            if echo_labels.contains(&value.as_str()) {
                echoed += 1;
                continue;
            }
        }

        records.push(row.to_record(&canonical));
    }

    info!(
        sheet,
        records = records.len(),
        header_rows = echoed,
        blank_rows = blank,
        "loaded invoice rows"
    );
    Ok(records)
}

struct Row<'a> {
    cells: &'a [Cell],
    index: &'a HashMap<&'a str, usize>,
    /// 1-based line in the sheet, header included
    line: usize,
}

impl Row<'_> {
    fn cell(&self, column: &str) -> Option<&Cell> {
        self.index.get(column).and_then(|&i| self.cells.get(i))
    }

    fn text(&self, column: &str) -> Option<String> {
        match self.cell(column)? {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(number_text(*n)),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    fn number(&self, column: &str) -> Option<f64> {
        let parsed = match self.cell(column)? {
            Cell::Empty => return None,
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) | Cell::Date(_) => None,
            Cell::Text(s) => parse_number(s),
        };
        if parsed.is_none() {
            debug!(line = self.line, column, "numeric coercion failed, value left missing");
        }
        parsed
    }

    fn date(&self, column: &str) -> Option<NaiveDate> {
        let parsed = match self.cell(column)? {
            Cell::Empty => return None,
            Cell::Date(d) => Some(*d),
            Cell::Number(n) => excel_serial_date(*n),
            Cell::Text(s) => parse_date(s),
        };
        if parsed.is_none() {
            debug!(line = self.line, column, "date coercion failed, value left missing");
        }
        parsed
    }

    fn to_record(&self, canonical: &[String]) -> InvoiceRecord {
        let date = self.date(columns::FECHA);
        let explicit_period = self.text(columns::PERIODO);

        let extra = canonical
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty() && !TYPED_COLUMNS.contains(&name.as_str()))
            .filter(|(i, name)| self.index.get(name.as_str()) == Some(i))
            .filter_map(|(i, name)| {
                let value = match self.cells.get(i)? {
                    Cell::Empty => return None,
                    Cell::Text(s) => s.clone(),
                    Cell::Number(n) => number_text(*n),
                    Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
                };
                Some((name.clone(), value))
            })
            .collect();

        InvoiceRecord {
            date,
            invoice_id: self.text(columns::FACTURA),
            client: self.text(columns::CLIENTE),
            project: self
                .text(columns::PROYECTO_OK)
                .or_else(|| self.text(columns::PROYECTO)),
            broker: self.text(columns::BROKER),
            hours_or_trips: self.number(columns::HORAS_VIAJE),
            unit_cost: self.number(columns::COSTO_UNITARIO),
            amount_charged: self.number(columns::TOTAL_COBRADO),
            amount_paid_to_broker: self.number(columns::PAGO_BROKER),
            period: derive::resolve_period(date, explicit_period.as_deref()),
            truck_id: self.text(columns::CAMION_ID),
            truck_number: self.text(columns::CAMION_NUM),
            ticket: self.text(columns::TICKET),
            running_total: self.number(columns::ACUMULADO),
            extra,
        }
    }
}

/// Whole numbers print without a fractional part (`1042.0` -> `1042`)
fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Parse a numeric cell, tolerating thousands separators and a currency sign
fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = match cleaned.strip_prefix("-$") {
        Some(rest) => format!("-{rest}"),
        None => cleaned,
    };
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Spreadsheet day serial (1900 date system) to a calendar date
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}
