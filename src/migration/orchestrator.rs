// ABOUTME: Per-collection migration sequencing: export, infer, load, cleanup
// ABOUTME: Isolates every failure to its collection so the run always completes

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::migration::export::CollectionExporter;
use crate::migration::loader::load_batch;
use crate::migration::schema::{derive_schema, ensure_table, sanitize_identifier};
use crate::postgres::SqlExecutor;

/// Per-collection migration result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// All documents loaded and committed.
    Loaded(usize),
    /// Nothing was loaded; the collection did not qualify (reason attached).
    Skipped(String),
    /// The collection failed; any partial load was rolled back.
    Failed(String),
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationOutcome::Loaded(count) => write!(f, "loaded {} rows", count),
            MigrationOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            MigrationOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of one collection, with its source and destination names.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub collection: String,
    pub table: String,
    pub outcome: MigrationOutcome,
}

/// Parse a staging artifact into an ordered document batch.
///
/// Accepts a JSON array of documents or a single document (a one-element
/// batch). Everything else is a skip reason: malformed content, an array
/// containing non-documents, a scalar payload, or an empty array (no
/// representative document to derive a schema from).
fn parse_staging(content: &str) -> Result<Vec<Map<String, Value>>, String> {
    let payload: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => return Err(format!("decode error: {}", e)),
    };

    match payload {
        Value::Object(document) => Ok(vec![document]),
        Value::Array(items) => {
            if items.is_empty() {
                return Err("no documents in staging artifact".to_string());
            }
            let mut documents = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(document) => documents.push(document),
                    other => {
                        return Err(format!(
                            "unexpected format: array element is not a document ({})",
                            value_kind(&other)
                        ))
                    }
                }
            }
            Ok(documents)
        }
        other => Err(format!(
            "unexpected format: payload is neither a document nor an array ({})",
            value_kind(&other)
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "document",
    }
}

/// Migrate every collection, one at a time, isolating failures
///
/// For each collection: export a staging artifact, parse it, infer and
/// create the destination table from the first document, load the whole
/// batch in one transaction, and delete the artifact on success. Failed or
/// skipped collections leave their artifact in place for inspection and
/// never abort the run.
///
/// Two collections whose names sanitize to the same table identifier would
/// silently interleave rows in one table; the first one claims the
/// identifier and later ones are rejected.
pub async fn migrate_collections(
    exporter: &dyn CollectionExporter,
    executor: &mut dyn SqlExecutor,
    collections: &[String],
    staging_dir: &Path,
) -> Vec<CollectionReport> {
    let mut reports = Vec::with_capacity(collections.len());
    let mut claimed_tables: HashMap<String, String> = HashMap::new();

    for (idx, collection) in collections.iter().enumerate() {
        tracing::info!(
            "Migrating collection {}/{}: '{}'",
            idx + 1,
            collections.len(),
            collection
        );

        let table = sanitize_identifier(collection);

        if let Some(owner) = claimed_tables.get(&table) {
            let reason = format!(
                "table identifier '{}' collides with collection '{}'",
                table, owner
            );
            tracing::error!("✗ Collection '{}' {}", collection, reason);
            reports.push(CollectionReport {
                collection: collection.clone(),
                table,
                outcome: MigrationOutcome::Failed(reason),
            });
            continue;
        }
        claimed_tables.insert(table.clone(), collection.clone());

        let outcome =
            migrate_one_collection(exporter, executor, collection, &table, staging_dir).await;

        match &outcome {
            MigrationOutcome::Loaded(count) => {
                tracing::info!("✓ Collection '{}' loaded ({} rows)", collection, count)
            }
            MigrationOutcome::Skipped(reason) => {
                tracing::warn!("⚠ Collection '{}' skipped: {}", collection, reason)
            }
            MigrationOutcome::Failed(reason) => {
                tracing::error!("✗ Collection '{}' failed: {}", collection, reason)
            }
        }

        reports.push(CollectionReport {
            collection: collection.clone(),
            table,
            outcome,
        });
    }

    reports
}

async fn migrate_one_collection(
    exporter: &dyn CollectionExporter,
    executor: &mut dyn SqlExecutor,
    collection: &str,
    table: &str,
    staging_dir: &Path,
) -> MigrationOutcome {
    let staging_path = staging_dir.join(format!("{}.json", collection));

    if let Err(e) = exporter.export(collection, &staging_path).await {
        return MigrationOutcome::Failed(format!("export failed: {:#}", e));
    }

    let artifact_size = std::fs::metadata(&staging_path).map(|m| m.len()).unwrap_or(0);
    if artifact_size == 0 {
        return MigrationOutcome::Skipped("staging artifact missing or empty".to_string());
    }

    let content = match std::fs::read_to_string(&staging_path) {
        Ok(content) => content,
        Err(e) => {
            return MigrationOutcome::Skipped(format!("could not read staging artifact: {}", e))
        }
    };

    // Malformed or unsupported artifacts stay on disk for inspection
    let documents = match parse_staging(&content) {
        Ok(documents) => documents,
        Err(reason) => return MigrationOutcome::Skipped(reason),
    };

    let schema = match derive_schema(table, &documents[0]) {
        Ok(schema) => schema,
        Err(e) => return MigrationOutcome::Skipped(format!("{:#}", e)),
    };

    if let Err(e) = ensure_table(executor, &schema).await {
        return MigrationOutcome::Failed(format!("table creation failed: {:#}", e));
    }

    let count = match load_batch(executor, table, &documents).await {
        Ok(count) => count,
        Err(e) => return MigrationOutcome::Failed(format!("{:#}", e)),
    };

    if let Err(e) = std::fs::remove_file(&staging_path) {
        tracing::warn!(
            "Could not delete staging artifact {}: {}",
            staging_path.display(),
            e
        );
    } else {
        tracing::debug!("Deleted staging artifact {}", staging_path.display());
    }

    MigrationOutcome::Loaded(count)
}
