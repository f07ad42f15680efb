pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod export;
pub mod filter;
pub mod ledger;
pub mod source;
pub mod summary;

pub use config::Config;
pub use dashboard::{render, DashboardView, Snapshot, SnapshotCache};
pub use error::{DashboardError, Result};
pub use filter::{FilterOptions, FilterState};
pub use ledger::InvoiceRecord;
pub use source::{Layout, SourceSpec};
pub use summary::{aggregate, GroupKey, Kpis, SummaryRow};
