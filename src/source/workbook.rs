use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Cell, Sheet, TabularSource};
use crate::error::{DashboardError, Result};

/// Excel/OpenDocument workbook read through calamine
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook =
            open_workbook_auto(path).map_err(|e| DashboardError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TabularSource for WorkbookSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet> {
        if !self.workbook.sheet_names().iter().any(|s| s == name) {
            return Err(DashboardError::SourceUnavailable {
                path: self.path.clone(),
                reason: format!("sheet '{name}' not found"),
            });
        }

        let range =
            self.workbook
                .worksheet_range(name)
                .map_err(|e| DashboardError::SourceUnavailable {
                    path: self.path.clone(),
                    reason: format!("sheet '{name}': {e}"),
                })?;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Cell>> = rows
            .map(|r| r.iter().map(cell_from_data).collect())
            .collect();

        debug!(sheet = name, rows = rows.len(), "read workbook sheet");
        Ok(Sheet { headers, rows })
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.trim().to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.as_f64().to_string(),
        Data::DateTimeIso(v) | Data::DurationIso(v) => v.trim().to_string(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(v) => Cell::text(v),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(v) => Cell::Text(v.to_string()),
        Data::DateTime(v) => match v.as_datetime() {
            Some(dt) => Cell::Date(dt.date()),
            None => Cell::Empty,
        },
        Data::DateTimeIso(v) | Data::DurationIso(v) => Cell::text(v),
        Data::Error(e) => {
            debug!(error = ?e, "spreadsheet error cell read as empty");
            Cell::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_cells_convert_to_cells() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Float(12.5)), Cell::Number(12.5));
        assert_eq!(cell_from_data(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(
            cell_from_data(&Data::String(" ACME ".to_string())),
            Cell::Text("ACME".to_string())
        );
        assert_eq!(cell_from_data(&Data::String("  ".to_string())), Cell::Empty);
    }

    #[test]
    fn header_cells_are_trimmed() {
        assert_eq!(header_text(&Data::String(" Fecha ".to_string())), "Fecha");
        assert_eq!(header_text(&Data::Empty), "");
    }
}
