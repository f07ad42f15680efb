//! Tabular sources and the row loader
//!
//! A source hands out named sheets as a header row plus typed cells. The
//! loader turns one sheet into [`InvoiceRecord`](crate::ledger::InvoiceRecord)s.

pub mod columns;
mod delimited;
mod loader;
mod memory;
mod workbook;

pub use columns::{ColumnMap, Layout};
pub use delimited::CsvSource;
pub use loader::load_records;
pub use memory::MemorySource;
pub use workbook::WorkbookSource;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A single spreadsheet cell after reading
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Build a cell from raw text; blank text is empty
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// One named table: a header row and its data rows
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// An external source of named tables
pub trait TabularSource {
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet; a missing sheet or unreadable file is `SourceUnavailable`
    fn read_sheet(&mut self, name: &str) -> Result<Sheet>;
}

/// Everything needed to load a session snapshot
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub layout: Layout,
    pub aliases: BTreeMap<String, String>,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            layout,
            aliases: BTreeMap::new(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet
            .as_deref()
            .unwrap_or_else(|| self.layout.default_sheet())
    }

    pub fn column_map(&self) -> ColumnMap {
        ColumnMap::for_layout(self.layout).with_aliases(&self.aliases)
    }
}

/// Open a source by file extension: `.csv`/`.tsv` as delimited text,
/// anything else as a workbook.
pub fn open_source(path: &Path) -> Result<Box<dyn TabularSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::open(path, b',')?)),
        Some("tsv") => Ok(Box::new(CsvSource::open(path, b'\t')?)),
        _ => Ok(Box::new(WorkbookSource::open(path)?)),
    }
}
