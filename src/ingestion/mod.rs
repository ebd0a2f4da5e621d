//! Ingestion and egress of delimited text.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects the delimiter from the file extension (or you can override it via
//!   [`IngestionOptions`])
//! - infers column types from the first data row
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! In-memory text goes through [`csv::ingest_csv_from_str`]; [`egress`] turns a dataset back into
//! text.

pub mod csv;
pub mod egress;
pub mod observability;
pub mod unified;

pub use egress::{to_csv_string, write_csv, write_csv_to_path};
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver,
};
pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions};
