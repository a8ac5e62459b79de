//! Ingestion and classification pipeline for the fuel plan spreadsheet.
//!
//! Text flows `parse` -> `columns` -> `processor`; `cache` wraps the whole
//! cycle behind a TTL with single-flight refresh, and `client` fetches the
//! published CSV over HTTP.

pub mod cache;
pub mod client;
pub mod clock;
pub mod columns;
pub mod error;
pub mod parse;
pub mod processor;
pub mod report;
pub mod status;
pub mod types;

pub use cache::{SnapshotCache, SnapshotView, DEFAULT_TTL_SECS};
pub use client::{SheetClient, SheetSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use columns::{map_rows, ColumnLayout};
pub use error::{FetchError, ReportError};
pub use parse::parse_csv;
pub use processor::{ingest_csv, process};
pub use report::{render_report, write_report, ReportKind};
pub use status::{classify, parse_fueling_date};
pub use types::{FuelStatus, ProcessedSnapshot, RawRow, SiteRecord, SnapshotCounts};
