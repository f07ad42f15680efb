pub mod derive;
mod record;

pub use record::{InvoiceRecord, RecordDetail};
