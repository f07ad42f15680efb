//! CSV export of the filtered detail table
//!
//! Columns match the detail view; a file written here reads back through
//! [`read_export`] with the same row count and sums.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::ledger::InvoiceRecord;

/// One exported detail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "FECHA")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "FACTURA")]
    pub invoice_id: Option<String>,
    #[serde(rename = "CLIENTE")]
    pub client: Option<String>,
    #[serde(rename = "PROYECTO_OK")]
    pub project: Option<String>,
    #[serde(rename = "HORAS_VIAJE")]
    pub hours_or_trips: Option<f64>,
    #[serde(rename = "COSTO_UNITARIO")]
    pub unit_cost: Option<f64>,
    #[serde(rename = "TOTAL_COBRADO")]
    pub amount_charged: Option<f64>,
    #[serde(rename = "PAGO_BROKER")]
    pub amount_paid_to_broker: Option<f64>,
    #[serde(rename = "UTILIDAD_BRUTA")]
    pub gross_profit: Option<f64>,
    #[serde(rename = "MARGEN_BRUTO")]
    pub margin_pct: f64,
    #[serde(rename = "PERIODO")]
    pub period: Option<String>,
    #[serde(rename = "BROKER")]
    pub broker: Option<String>,
}

impl From<&InvoiceRecord> for ExportRow {
    fn from(r: &InvoiceRecord) -> Self {
        Self {
            date: r.date,
            invoice_id: r.invoice_id.clone(),
            client: r.client.clone(),
            project: r.project.clone(),
            hours_or_trips: r.hours_or_trips,
            unit_cost: r.unit_cost,
            amount_charged: r.amount_charged,
            amount_paid_to_broker: r.amount_paid_to_broker,
            gross_profit: r.gross_profit(),
            margin_pct: r.margin_pct(),
            period: r.period.clone(),
            broker: r.broker.clone(),
        }
    }
}

/// File name stamped with the export time
pub fn export_filename(now: DateTime<Local>) -> String {
    format!("facturas_filtradas_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write `records` as UTF-8 CSV with a header row; returns the row count
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a InvoiceRecord>,
{
    let mut out = csv::Writer::from_writer(writer);
    let mut count = 0;
    for record in records {
        out.serialize(ExportRow::from(record))?;
        count += 1;
    }
    if count == 0 {
        // serialize() never ran, so the header has not been written yet
        out.write_record(HEADERS)?;
    }
    out.flush()?;
    Ok(count)
}

const HEADERS: &[&str] = &[
    "FECHA",
    "FACTURA",
    "CLIENTE",
    "PROYECTO_OK",
    "HORAS_VIAJE",
    "COSTO_UNITARIO",
    "TOTAL_COBRADO",
    "PAGO_BROKER",
    "UTILIDAD_BRUTA",
    "MARGEN_BRUTO",
    "PERIODO",
    "BROKER",
];

/// Export into `dir` under a timestamped name; returns the file path
pub fn export_to_dir<'a, I>(dir: &Path, records: I, now: DateTime<Local>) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a InvoiceRecord>,
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now));
    let rows = write_csv(File::create(&path)?, records)?;
    info!(path = %path.display(), rows, "exported filtered records");
    Ok(path)
}

/// Parse a previously exported file
pub fn read_export<R: Read>(reader: R) -> Result<Vec<ExportRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn records() -> Vec<InvoiceRecord> {
        vec![
            InvoiceRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 15),
                invoice_id: Some("1042".into()),
                client: Some("ACME, S.A.".into()),
                project: Some("Puente Norte".into()),
                broker: Some("Ruiz".into()),
                hours_or_trips: Some(8.0),
                unit_cost: Some(12.5),
                amount_charged: Some(100.0),
                amount_paid_to_broker: Some(40.0),
                period: Some("2024-01".into()),
                ..Default::default()
            },
            InvoiceRecord {
                invoice_id: Some("1043".into()),
                client: Some("Beta".into()),
                amount_charged: Some(50.25),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn filename_carries_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(export_filename(now), "facturas_filtradas_20240305_140709.csv");
    }

    #[test]
    fn round_trip_preserves_count_and_sums() {
        let records = records();
        let mut buf = Vec::new();
        let written = write_csv(&mut buf, &records).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("FECHA,FACTURA,CLIENTE,PROYECTO_OK,"));

        let rows = read_export(buf.as_slice()).unwrap();
        assert_eq!(rows.len(), records.len());

        let charged: f64 = rows.iter().filter_map(|r| r.amount_charged).sum();
        let expected: f64 = records.iter().filter_map(|r| r.amount_charged).sum();
        assert!((charged - expected).abs() < 0.005);

        assert_eq!(rows[0].client.as_deref(), Some("ACME, S.A."));
        assert_eq!(rows[0].gross_profit, Some(60.0));
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(rows[1].gross_profit, None);
        assert_eq!(rows[1].margin_pct, 0.0);
        assert_eq!(rows[1].period, None);
    }

    #[test]
    fn empty_export_still_has_header() {
        let records: Vec<InvoiceRecord> = Vec::new();
        let mut buf = Vec::new();
        assert_eq!(write_csv(&mut buf, &records).unwrap(), 0);
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(read_export(buf.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn export_to_dir_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let path = export_to_dir(&out, &records(), now).unwrap();
        assert!(path.ends_with("facturas_filtradas_20240305_140709.csv"));
        let rows = read_export(File::open(&path).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
