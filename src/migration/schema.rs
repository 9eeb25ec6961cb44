// ABOUTME: Table schema inference from a representative document
// ABOUTME: Sanitizes identifiers, classifies value types, and creates tables idempotently

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::postgres::SqlExecutor;

/// Destination column type for a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnType {
    /// SQL type name used in CREATE TABLE statements.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
        }
    }
}

/// One inferred column: sanitized name plus type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Inferred table schema: sanitized table name plus ordered columns.
///
/// Derived once per collection from exactly one representative document; the
/// column order is that document's field order.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<Column>,
}

/// Normalize a raw collection or field name into a valid SQL identifier
///
/// Every maximal run of characters outside `[A-Za-z0-9_]` collapses to a
/// single underscore. Deterministic and pure; distinct raw names can collide
/// after sanitization, which the orchestrator detects and rejects.
///
/// # Examples
///
/// ```
/// # use mongo_postgres_migrator::migration::schema::sanitize_identifier;
/// assert_eq!(sanitize_identifier("orders-2024!"), "orders_2024_");
/// assert_eq!(sanitize_identifier("user events"), "user_events");
/// ```
pub fn sanitize_identifier(raw: &str) -> String {
    let mut sanitized = String::with_capacity(raw.len());
    let mut last_was_underscore = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            sanitized.push(c);
            last_was_underscore = c == '_';
        } else if !last_was_underscore {
            sanitized.push('_');
            last_was_underscore = true;
        }
    }

    sanitized
}

/// Classify a document value into a destination column type
///
/// Text is the default for anything not recognized as integer, float, or
/// boolean; nested structures are stored as serialized text. The boolean arm
/// is checked ahead of the numeric one — some source encodings carry
/// booleans as 0/1.
pub fn classify(value: &Value) -> ColumnType {
    match value {
        Value::Bool(_) => ColumnType::Boolean,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                ColumnType::Integer
            } else {
                ColumnType::Float
            }
        }
        _ => ColumnType::Text,
    }
}

/// Derive a table schema from a representative document
///
/// Classifies every field in the document's own order. The table name is
/// expected to be sanitized already; field names are sanitized here.
///
/// # Errors
///
/// Fails on a document with no fields — there is nothing to derive a column
/// set from.
pub fn derive_schema(table: &str, representative: &Map<String, Value>) -> Result<TableSchema> {
    if representative.is_empty() {
        bail!(
            "Cannot derive a schema for table '{}': representative document has no fields",
            table
        );
    }

    let columns = representative
        .iter()
        .map(|(name, value)| Column {
            name: sanitize_identifier(name),
            column_type: classify(value),
        })
        .collect();

    Ok(TableSchema {
        table: table.to_string(),
        columns,
    })
}

/// Render the CREATE TABLE statement for a schema.
fn create_table_sql(schema: &TableSchema) -> String {
    let column_defs: Vec<String> = schema
        .columns
        .iter()
        .map(|col| format!("\"{}\" {}", col.name, col.column_type.sql_type()))
        .collect();

    format!(
        "CREATE TABLE \"{}\" ({})",
        schema.table,
        column_defs.join(", ")
    )
}

/// Create the table for a schema if it does not already exist
///
/// Checks the destination catalog first; if the table is present nothing
/// happens — no column reconciliation, no error. At most one creation
/// attempt per call. The existence check and the create are not atomic;
/// callers are sequential and single-threaded.
pub async fn ensure_table(executor: &mut dyn SqlExecutor, schema: &TableSchema) -> Result<()> {
    if executor.table_exists(&schema.table).await? {
        tracing::debug!("Table '{}' already exists, leaving it as is", schema.table);
        return Ok(());
    }

    let sql = create_table_sql(schema);
    tracing::info!(
        "Creating table '{}' with {} columns",
        schema.table,
        schema.columns.len()
    );

    executor
        .execute(&sql, &[])
        .await
        .with_context(|| format!("Failed to create table '{}'", schema.table))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize_identifier("users"), "users");
        assert_eq!(sanitize_identifier("user_events_2024"), "user_events_2024");
    }

    #[test]
    fn test_sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_identifier("orders-2024!"), "orders_2024_");
        assert_eq!(sanitize_identifier("a.b.c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_identifier("a--b"), "a_b");
        assert_eq!(sanitize_identifier("a - b"), "a_b");
        assert_eq!(sanitize_identifier("!!!x!!!"), "_x_");
    }

    #[test]
    fn test_sanitize_output_alphabet() {
        let inputs = ["weird name!", "tab\tchar", "ünïcode", "a/b\\c"];
        for input in inputs {
            let sanitized = sanitize_identifier(input);
            assert!(
                sanitized
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "sanitized '{}' contains invalid characters: '{}'",
                input,
                sanitized
            );
        }
    }

    #[test]
    fn test_classify_scalars() {
        assert_eq!(classify(&json!(true)), ColumnType::Boolean);
        assert_eq!(classify(&json!(42)), ColumnType::Integer);
        assert_eq!(classify(&json!(1.5)), ColumnType::Float);
        assert_eq!(classify(&json!("hello")), ColumnType::Text);
        assert_eq!(classify(&json!(null)), ColumnType::Text);
    }

    #[test]
    fn test_classify_structures_as_text() {
        assert_eq!(classify(&json!([1, 2, 3])), ColumnType::Text);
        assert_eq!(classify(&json!({"nested": true})), ColumnType::Text);
    }

    #[test]
    fn test_derive_schema_preserves_field_order() {
        let representative = doc(json!({
            "a": 1,
            "b": "x"
        }));

        let schema = derive_schema("items", &representative).unwrap();

        assert_eq!(schema.table, "items");
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.columns[0].name, "a");
        assert_eq!(schema.columns[0].column_type, ColumnType::Integer);
        assert_eq!(schema.columns[1].name, "b");
        assert_eq!(schema.columns[1].column_type, ColumnType::Text);
    }

    #[test]
    fn test_derive_schema_sanitizes_field_names() {
        let representative = doc(json!({
            "field name!": 1
        }));

        let schema = derive_schema("items", &representative).unwrap();
        assert_eq!(schema.columns[0].name, "field_name_");
    }

    #[test]
    fn test_derive_schema_rejects_empty_document() {
        let representative = Map::new();
        assert!(derive_schema("items", &representative).is_err());
    }

    #[test]
    fn test_create_table_sql() {
        let representative = doc(json!({
            "id": 1,
            "price": 9.99,
            "active": true,
            "name": "widget",
            "tags": ["a", "b"]
        }));

        let schema = derive_schema("products", &representative).unwrap();
        let sql = create_table_sql(&schema);

        assert_eq!(
            sql,
            "CREATE TABLE \"products\" (\"id\" INTEGER, \"price\" DOUBLE PRECISION, \
             \"active\" BOOLEAN, \"name\" TEXT, \"tags\" TEXT)"
        );
    }
}
