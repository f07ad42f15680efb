use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Sheet, TabularSource};
use crate::error::{DashboardError, Result};

/// Sheets held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: BTreeMap<String, Sheet>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, sheet: Sheet) -> Self {
        self.sheets.insert(name.to_string(), sheet);
        self
    }
}

impl TabularSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| DashboardError::SourceUnavailable {
                path: PathBuf::from("<memory>"),
                reason: format!("sheet '{name}' not found"),
            })
    }
}
