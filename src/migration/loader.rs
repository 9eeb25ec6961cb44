// ABOUTME: All-or-nothing batch loading of documents into one table
// ABOUTME: One transaction per collection, first insert failure rolls everything back

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::migration::schema::sanitize_identifier;
use crate::migration::values::{normalize_document, to_sql_value};
use crate::postgres::{SqlExecutor, SqlValue};

/// Render the INSERT statement and parameters for one document.
///
/// The column list comes from the document's own fields in their own order;
/// a field the table does not have makes the insert (and therefore the whole
/// batch) fail, rather than being silently dropped.
fn build_insert(table: &str, document: &Map<String, Value>) -> (String, Vec<SqlValue>) {
    let mut columns = Vec::with_capacity(document.len());
    let mut placeholders = Vec::with_capacity(document.len());
    let mut params = Vec::with_capacity(document.len());

    for (idx, (field, value)) in document.iter().enumerate() {
        columns.push(format!("\"{}\"", sanitize_identifier(field)));
        placeholders.push(format!("${}", idx + 1));
        params.push(to_sql_value(value));
    }

    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );

    (sql, params)
}

/// Load a batch of documents into a table inside one transaction
///
/// Documents are normalized and inserted in order, one row each, with all
/// values bound as parameters. The failure contract is strict: the first
/// failing insert aborts the batch immediately, the transaction is rolled
/// back, and no partial data remains. On success a single commit covers the
/// whole batch.
///
/// # Arguments
///
/// * `executor` - Statement executor for the target store
/// * `table` - Sanitized destination table name
/// * `documents` - Full ordered batch for one collection
///
/// # Returns
///
/// Number of rows loaded (always `documents.len()` on success)
pub async fn load_batch(
    executor: &mut dyn SqlExecutor,
    table: &str,
    documents: &[Map<String, Value>],
) -> Result<usize> {
    executor.begin().await?;

    for (doc_num, document) in documents.iter().enumerate() {
        let normalized = normalize_document(document);
        let (sql, params) = build_insert(table, &normalized);

        if let Err(e) = executor.execute(&sql, &params).await {
            tracing::warn!(
                "Insert of document {} into '{}' failed, rolling back batch",
                doc_num + 1,
                table
            );
            if let Err(rollback_err) = executor.rollback().await {
                tracing::error!("Rollback of '{}' also failed: {:#}", table, rollback_err);
            }
            return Err(e).with_context(|| {
                format!(
                    "Failed to insert document {} of {} into table '{}'",
                    doc_num + 1,
                    documents.len(),
                    table
                )
            });
        }
    }

    executor
        .commit()
        .await
        .with_context(|| format!("Failed to commit batch for table '{}'", table))?;

    tracing::info!("✓ Loaded {} rows into '{}'", documents.len(), table);
    Ok(documents.len())
}
