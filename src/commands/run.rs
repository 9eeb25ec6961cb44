// ABOUTME: Full workflow command: migrate all collections, then export a package
// ABOUTME: Mirrors the reference flow of load-everything followed by packaging

use anyhow::Result;

use crate::commands;
use crate::config::Config;

/// Run the full workflow: migration followed by package export
///
/// The package step runs even when individual collections were skipped or
/// failed — their outcomes are already reported — but a fatal migration
/// error (connection, missing export tool) stops the workflow before
/// packaging.
pub async fn run(config: &Config) -> Result<()> {
    commands::migrate(config).await?;
    commands::package(config).await
}
