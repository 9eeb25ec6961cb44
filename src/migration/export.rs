// ABOUTME: Wrapper for the external mongoexport tool
// ABOUTME: Materializes one collection into a staging JSON artifact

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Materializes one collection into a staging artifact on disk.
///
/// The production implementation shells out to mongoexport; tests substitute
/// a fake that writes canned artifacts.
#[async_trait]
pub trait CollectionExporter: Send + Sync {
    /// Export a collection to the given destination path.
    ///
    /// A non-zero tool exit is an error; the orchestrator reports it as a
    /// per-collection failure and moves on.
    async fn export(&self, collection: &str, dest: &Path) -> Result<()>;
}

/// Export collaborator backed by the mongoexport binary.
pub struct MongoExport {
    tool: PathBuf,
    source_url: String,
}

impl MongoExport {
    /// # Arguments
    ///
    /// * `tool` - Resolved path to the mongoexport binary
    /// * `source_url` - MongoDB connection URL including the database name
    pub fn new(tool: PathBuf, source_url: String) -> Self {
        Self { tool, source_url }
    }
}

#[async_trait]
impl CollectionExporter for MongoExport {
    async fn export(&self, collection: &str, dest: &Path) -> Result<()> {
        tracing::info!(
            "Exporting collection '{}' to {}",
            collection,
            dest.display()
        );

        // Explicit argument vector, no shell string assembly
        let output = Command::new(&self.tool)
            .arg(format!("--uri={}", self.source_url))
            .arg(format!("--collection={}", collection))
            .arg("--jsonArray")
            .arg("--out")
            .arg(dest)
            .output()
            .context("Failed to execute mongoexport. Are the MongoDB database tools installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "mongoexport failed for collection '{}': {}",
                collection,
                stderr.trim()
            );
        }

        tracing::debug!("✓ Collection '{}' exported", collection);
        Ok(())
    }
}
