// ABOUTME: Statement execution seam over the target relational store
// ABOUTME: Defines SqlValue parameter binding and the PgExecutor production impl

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::Client;

/// A dynamically-typed value bound as a statement parameter.
///
/// Closed tagged variant covering everything a document field can load as.
/// Nested structures arrive here already serialized to their canonical JSON
/// text, as `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Text rendering used when the destination column is textual.
    fn render_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
        }
    }
}

fn mismatch(value: &SqlValue, ty: &Type) -> Box<dyn std::error::Error + Sync + Send> {
    format!("cannot bind {:?} to column of type {}", value, ty).into()
}

impl ToSql for SqlValue {
    /// Encode by the column's declared type.
    ///
    /// Text columns accept any variant (rendered to text, matching the
    /// reference behavior of storing unrecognized values as text); typed
    /// columns accept only a compatible variant and error otherwise, so a
    /// mismatched document fails its batch instead of corrupting a row.
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        if matches!(self, SqlValue::Null) {
            return Ok(IsNull::Yes);
        }

        if *ty == Type::TEXT || *ty == Type::VARCHAR {
            return self.render_text().to_sql(ty, out);
        }

        if *ty == Type::BOOL {
            return match self {
                SqlValue::Bool(b) => b.to_sql(ty, out),
                other => Err(mismatch(other, ty)),
            };
        }

        if *ty == Type::INT4 {
            return match self {
                SqlValue::Int(i) => {
                    let narrowed = i32::try_from(*i).map_err(|_| {
                        Box::<dyn std::error::Error + Sync + Send>::from(format!(
                            "integer value {} out of range for INTEGER column",
                            i
                        ))
                    })?;
                    narrowed.to_sql(ty, out)
                }
                other => Err(mismatch(other, ty)),
            };
        }

        if *ty == Type::FLOAT8 {
            return match self {
                SqlValue::Float(f) => f.to_sql(ty, out),
                SqlValue::Int(i) => (*i as f64).to_sql(ty, out),
                other => Err(mismatch(other, ty)),
            };
        }

        Err(mismatch(self, ty))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::BOOL
            || *ty == Type::INT4
            || *ty == Type::FLOAT8
            || *ty == Type::TEXT
            || *ty == Type::VARCHAR
    }

    to_sql_checked!();
}

/// Sequential statement execution against the target relational store.
///
/// The migrator drives exactly one implementation at a time over a single
/// shared connection; transaction scope is one collection's batch. Tests
/// substitute an in-memory fake to exercise the loader and orchestrator
/// without a live database.
#[async_trait]
pub trait SqlExecutor: Send {
    /// Execute a parameter-bound statement, returning the affected row count.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Catalog existence lookup for a table name.
    async fn table_exists(&mut self, table: &str) -> Result<bool>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Production executor over a tokio-postgres client.
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        self.client
            .execute(sql, &param_refs)
            .await
            .with_context(|| format!("Failed to execute statement: {}", sql))
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                     SELECT 1 FROM information_schema.tables
                     WHERE table_schema = 'public' AND table_name = $1
                 )",
                &[&table],
            )
            .await
            .with_context(|| format!("Failed to check existence of table '{}'", table))?;

        Ok(row.get(0))
    }

    async fn begin(&mut self) -> Result<()> {
        self.client
            .batch_execute("BEGIN")
            .await
            .context("Failed to begin transaction")
    }

    async fn commit(&mut self) -> Result<()> {
        self.client
            .batch_execute("COMMIT")
            .await
            .context("Failed to commit transaction")
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client
            .batch_execute("ROLLBACK")
            .await
            .context("Failed to roll back transaction")
    }
}
