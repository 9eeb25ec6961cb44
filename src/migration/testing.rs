// ABOUTME: In-memory fakes for the executor, exporter, and delay seams
// ABOUTME: Lets loader, orchestrator, and retrier tests run without external services

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::migration::export::CollectionExporter;
use crate::migration::package::Delay;
use crate::postgres::{SqlExecutor, SqlValue};

/// One recorded statement with its bound parameters.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Recording executor with injectable failures.
///
/// Statements are recorded in order, including the failing one. A successful
/// CREATE TABLE registers the table so later existence checks see it.
#[derive(Default)]
pub struct FakeExecutor {
    pub statements: Vec<Statement>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub existing_tables: HashSet<String>,
    fail_on: Option<usize>,
    fail_needle: Option<String>,
    executed: usize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the nth call to `execute` (1-based, counting every statement).
    pub fn fail_on_statement(&mut self, n: usize) {
        self.fail_on = Some(n);
    }

    /// Fail any statement whose SQL contains the given fragment.
    pub fn fail_matching(&mut self, needle: &str) {
        self.fail_needle = Some(needle.to_string());
    }

    /// Statements recorded for one table, in execution order.
    pub fn statements_for(&self, table: &str) -> Vec<&Statement> {
        let marker = format!("\"{}\"", table);
        self.statements
            .iter()
            .filter(|s| s.sql.contains(&marker))
            .collect()
    }
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.executed += 1;
        self.statements.push(Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if self.fail_on == Some(self.executed) {
            bail!("injected statement failure");
        }
        if let Some(needle) = &self.fail_needle {
            if sql.contains(needle.as_str()) {
                bail!("injected statement failure");
            }
        }

        if let Some(rest) = sql.strip_prefix("CREATE TABLE \"") {
            if let Some(table) = rest.split('"').next() {
                self.existing_tables.insert(table.to_string());
            }
        }

        Ok(1)
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.existing_tables.contains(table))
    }

    async fn begin(&mut self) -> Result<()> {
        self.begins += 1;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        Ok(())
    }
}

/// Exporter fake that writes canned artifact content per collection.
///
/// A collection mapped to `None` simulates a non-zero tool exit; an absent
/// mapping writes nothing (missing artifact).
#[derive(Default)]
pub struct FakeExporter {
    artifacts: HashMap<String, Option<String>>,
}

impl FakeExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, collection: &str, content: &str) -> Self {
        self.artifacts
            .insert(collection.to_string(), Some(content.to_string()));
        self
    }

    pub fn with_failure(mut self, collection: &str) -> Self {
        self.artifacts.insert(collection.to_string(), None);
        self
    }
}

#[async_trait]
impl CollectionExporter for FakeExporter {
    async fn export(&self, collection: &str, dest: &Path) -> Result<()> {
        match self.artifacts.get(collection) {
            Some(Some(content)) => {
                std::fs::write(dest, content)?;
                Ok(())
            }
            Some(None) => bail!("export tool exited with status 1"),
            None => Ok(()), // tool "succeeded" but produced nothing
        }
    }
}

/// Delay fake that counts waits without elapsing time.
#[derive(Default)]
pub struct CountingDelay {
    pub waits: AtomicU32,
}

impl CountingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delay for CountingDelay {
    async fn wait(&self, _duration: Duration) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }
}
