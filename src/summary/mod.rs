//! Grouping, ranking and headline figures over invoice records

mod aggregate;
mod kpi;
mod trend;

pub use aggregate::{aggregate, top_n, GroupKey, GroupValue, Metric, SummaryRow};
pub use kpi::Kpis;
pub use trend::{period_trend, PeriodTrend};
