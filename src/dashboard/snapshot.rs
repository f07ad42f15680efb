use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::error::Result;
use crate::filter::FilterOptions;
use crate::ledger::InvoiceRecord;
use crate::source::{load_records, open_source, Layout, SourceSpec, TabularSource};

/// The immutable record set of a session
#[derive(Debug)]
pub struct Snapshot {
    records: Vec<InvoiceRecord>,
    path: PathBuf,
    sheet: String,
    layout: Layout,
    loaded_at: DateTime<Local>,
}

impl Snapshot {
    /// Open the source named by `spec` and load its sheet
    pub fn load(spec: &SourceSpec) -> Result<Self> {
        let mut source = open_source(&spec.path)?;
        Self::load_from(source.as_mut(), spec)
    }

    pub fn load_from(source: &mut dyn TabularSource, spec: &SourceSpec) -> Result<Self> {
        let sheet = spec.sheet_name().to_string();
        let records = load_records(
            source,
            &sheet,
            &spec.column_map(),
            spec.layout.discriminator(),
        )?;
        Ok(Self {
            records,
            path: spec.path.clone(),
            sheet,
            layout: spec.layout,
            loaded_at: Local::now(),
        })
    }

    pub fn from_records(records: Vec<InvoiceRecord>) -> Self {
        Self {
            records,
            path: PathBuf::new(),
            sheet: String::new(),
            layout: Layout::default(),
            loaded_at: Local::now(),
        }
    }

    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    /// Selector values over the whole snapshot, independent of filters
    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.records)
    }
}

/// Holds the loaded snapshot for the life of the process.
///
/// Loads on first access and hands out shared references afterwards; only
/// [`SnapshotCache::reload`] replaces the snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: RwLock<Option<Arc<Snapshot>>>,
}

static GLOBAL: SnapshotCache = SnapshotCache::new();

impl SnapshotCache {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn global() -> &'static SnapshotCache {
        &GLOBAL
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<Snapshot>,
    {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(load()?);
        info!(records = snapshot.records.len(), "snapshot loaded");
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Replace the snapshot; on failure the previous one stays in place
    pub fn reload<F>(&self, load: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<Snapshot>,
    {
        let snapshot = Arc::new(load()?);
        info!(records = snapshot.records.len(), "snapshot reloaded");
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::source::{Cell, MemorySource, Sheet};

    fn one_record(client: &str) -> Snapshot {
        Snapshot::from_records(vec![InvoiceRecord {
            client: Some(client.to_string()),
            ..Default::default()
        }])
    }

    #[test]
    fn loads_once_and_shares() {
        let cache = SnapshotCache::new();
        let first = cache.get_or_load(|| Ok(one_record("A"))).unwrap();
        let second = cache
            .get_or_load(|| panic!("loader must not run twice"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn reload_replaces_snapshot() {
        let cache = SnapshotCache::new();
        cache.get_or_load(|| Ok(one_record("A"))).unwrap();
        let reloaded = cache.reload(|| Ok(one_record("B"))).unwrap();
        assert_eq!(reloaded.records()[0].client.as_deref(), Some("B"));
        let current = cache.current().unwrap();
        assert!(Arc::ptr_eq(&current, &reloaded));
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let cache = SnapshotCache::new();
        cache.get_or_load(|| Ok(one_record("A"))).unwrap();
        let result = cache.reload(|| Err(DashboardError::NoSourceConfigured));
        assert!(result.is_err());
        assert_eq!(
            cache.current().unwrap().records()[0].client.as_deref(),
            Some("A")
        );
    }

    #[test]
    fn failed_first_load_leaves_cache_empty() {
        let cache = SnapshotCache::new();
        assert!(cache
            .get_or_load(|| Err(DashboardError::NoSourceConfigured))
            .is_err());
        assert!(cache.current().is_none());
    }

    #[test]
    fn load_from_uses_layout_sheet() {
        let sheet = Sheet {
            headers: vec!["Factura".into(), "Clientes".into()],
            rows: vec![vec![Cell::Number(1.0), Cell::text("ACME")]],
        };
        let mut source = MemorySource::new().with_sheet("Facturas Generales", sheet);
        let spec = SourceSpec::new("memoria.xlsx", Layout::Invoices);

        let snapshot = Snapshot::load_from(&mut source, &spec).unwrap();
        assert_eq!(snapshot.sheet(), "Facturas Generales");
        assert_eq!(snapshot.records().len(), 1);
        assert_eq!(snapshot.options().clients, vec!["ACME"]);
    }

    #[test]
    fn missing_sheet_is_source_unavailable() {
        let mut source = MemorySource::new().with_sheet("Otra", Sheet::default());
        let spec = SourceSpec::new("memoria.xlsx", Layout::Combined);

        let err = Snapshot::load_from(&mut source, &spec).unwrap_err();
        match err {
            DashboardError::SourceUnavailable { reason, .. } => {
                assert!(reason.contains("Ingresos_vs_Costos"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
