//! Session snapshot and the per-filter view model

mod snapshot;
mod view;

pub use snapshot::{Snapshot, SnapshotCache};
pub use view::{render, DashboardView};
