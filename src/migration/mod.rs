// ABOUTME: Core migration pipeline: schema inference, loading, and packaging
// ABOUTME: Exports per-collection migration and the package-export retrier

pub mod export;
pub mod loader;
pub mod orchestrator;
pub mod package;
pub mod schema;
pub mod values;

#[cfg(test)]
pub mod testing;

pub use export::{CollectionExporter, MongoExport};
pub use loader::load_batch;
pub use orchestrator::{migrate_collections, CollectionReport, MigrationOutcome};
pub use package::{produce_export_package, Delay, RetryOutcome, TokioDelay};
pub use schema::{derive_schema, ensure_table, sanitize_identifier, ColumnType, TableSchema};
pub use values::normalize_document;
