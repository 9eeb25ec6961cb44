// ABOUTME: Document value normalization and conversion to bindable parameters
// ABOUTME: Rewrites object-identifier references and maps JSON values to SqlValue

use serde_json::{Map, Value};

use crate::postgres::SqlValue;

/// Rewrite object-identifier references into plain text form
///
/// mongoexport renders an ObjectId as `{"$oid": "..."}`. At the top level of
/// the document such a value is replaced by its hex string; inside a
/// top-level array the replacement is applied element-wise. Normalization is
/// shallow — structures nested deeper keep their reference form and are
/// serialized as text during load.
///
/// The input document is not mutated; a new document is returned.
///
/// # Examples
///
/// ```
/// # use mongo_postgres_migrator::migration::values::normalize_document;
/// # use serde_json::json;
/// let doc = json!({"_id": {"$oid": "65f1ab"}, "name": "alice"});
/// let normalized = normalize_document(doc.as_object().unwrap());
/// assert_eq!(normalized["_id"], json!("65f1ab"));
/// assert_eq!(normalized["name"], json!("alice"));
/// ```
pub fn normalize_document(document: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = Map::with_capacity(document.len());

    for (key, value) in document {
        let rewritten = match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| rewrite_oid(item).clone()).collect())
            }
            other => rewrite_oid(other).clone(),
        };
        normalized.insert(key.clone(), rewritten);
    }

    normalized
}

/// Replace a `{"$oid": "..."}` reference with its string form, one level only.
fn rewrite_oid(value: &Value) -> &Value {
    if let Value::Object(map) = value {
        if let Some(oid @ Value::String(_)) = map.get("$oid") {
            return oid;
        }
    }
    value
}

/// Convert a document value into a bindable parameter
///
/// Nulls bind as SQL NULL, never as the text "null". Nested arrays and
/// objects are serialized to their canonical JSON text. Integer-valued
/// numbers outside the i64 range fall back to float.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Float(f)
            } else {
                SqlValue::Text(n.to_string())
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        nested => SqlValue::Text(nested.to_string()),
    }
}
