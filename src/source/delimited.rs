use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Cell, Sheet, TabularSource};
use crate::error::{DashboardError, Result};

/// A single delimited text table.
///
/// CSV files carry one table, so any requested sheet name resolves to it.
pub struct CsvSource {
    path: PathBuf,
    sheet: Sheet,
}

impl CsvSource {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let unavailable = |e: csv::Error| DashboardError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(unavailable)?;

        let headers = reader
            .byte_headers()
            .map_err(unavailable)?
            .iter()
            .map(|h| decode(h).trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.map_err(unavailable)?;
            rows.push(record.iter().map(|field| Cell::text(&decode(field))).collect());
        }

        debug!(path = %path.display(), rows = rows.len(), "read delimited source");
        Ok(Self {
            path: path.to_path_buf(),
            sheet: Sheet { headers, rows },
        })
    }

    fn table_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Field text; bytes that are not UTF-8 become U+FFFD instead of failing the file
fn decode(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(text) => text.to_string(),
        Err(e) => {
            debug!(error = %e, "non UTF-8 field decoded lossily");
            String::from_utf8_lossy(field).into_owned()
        }
    }
}

impl TabularSource for CsvSource {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.table_name()]
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet> {
        if name != self.table_name() {
            debug!(
                requested = name,
                table = %self.table_name(),
                "delimited source has a single table, ignoring sheet name"
            );
        }
        Ok(self.sheet.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{load_records, ColumnMap, Layout};
    use std::fs;

    #[test]
    fn reads_headers_and_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facturas.csv");
        fs::write(
            &path,
            "\u{feff}Fecha,Factura,Clientes\n2024-01-05,101,ACME\n2024-01-06,, \n",
        )
        .unwrap();

        let mut source = CsvSource::open(&path, b',').unwrap();
        assert_eq!(source.sheet_names(), vec!["facturas".to_string()]);

        let sheet = source.read_sheet("Facturas Generales").unwrap();
        assert_eq!(sheet.headers, vec!["Fecha", "Factura", "Clientes"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][2], Cell::Text("ACME".to_string()));
        assert_eq!(sheet.rows[1][1], Cell::Empty);
        assert_eq!(sheet.rows[1][2], Cell::Empty);
    }

    #[test]
    fn invalid_utf8_cell_keeps_the_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facturas.csv");
        let mut bytes = b"Fecha,Factura,Clientes,Total Cobrado,Pago a Broker\n".to_vec();
        bytes.extend_from_slice(b"2024-01-05,101,Construcci\xF3n,100,40\n");
        bytes.extend_from_slice(b"2024-01-06,102,ACME,50,10\n");
        fs::write(&path, bytes).unwrap();

        let mut source = CsvSource::open(&path, b',').unwrap();
        let records = load_records(
            &mut source,
            "facturas",
            &ColumnMap::for_layout(Layout::Invoices),
            Layout::Invoices.discriminator(),
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client.as_deref(), Some("Construcci\u{fffd}n"));
        assert_eq!(records[0].amount_charged, Some(100.0));
        assert_eq!(records[1].client.as_deref(), Some("ACME"));
    }

    #[test]
    fn short_rows_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facturas.csv");
        fs::write(&path, "Fecha,Factura,Clientes\n2024-01-05,101\n").unwrap();

        let mut source = CsvSource::open(&path, b',').unwrap();
        let sheet = source.read_sheet("facturas").unwrap();
        assert_eq!(sheet.rows[0].len(), 2);
    }
}
