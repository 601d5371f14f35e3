pub mod export;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod import;
pub mod snapshot;

pub use export::{archive_name, unused_archive_path, ExportOptions, ExportOutcome, Exporter};
pub use import::{ImportOptions, Importer, RunSummary, TEMP_REMOTE};
pub use snapshot::build_snapshot;
