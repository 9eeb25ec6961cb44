// ABOUTME: Package command: produce the portable export of the target database
// ABOUTME: Wraps pg_dump with the bounded retry policy from configuration

use anyhow::{bail, Result};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::migration::{produce_export_package, RetryOutcome, TokioDelay};

/// Produce the portable package of the target database
///
/// A missing pg_dump binary fails immediately without any attempt; execution
/// failures are retried per the configured policy, and exhaustion is an
/// error.
pub async fn package(config: &Config) -> Result<()> {
    tracing::info!("Starting package export...");

    let delay = TokioDelay;
    let (outcome, path) = produce_export_package(
        &config.tools.pg_dump,
        &config.target.url,
        Path::new(&config.package.output_dir),
        config.package.max_retries,
        Duration::from_secs(config.package.backoff_secs),
        &delay,
    )
    .await?;

    match outcome {
        RetryOutcome::Succeeded => {
            tracing::info!("✅ Package export complete: {}", path.display());
            Ok(())
        }
        RetryOutcome::FailedAfterRetries(attempts) => {
            bail!(
                "Package export failed after {} attempts (target file: {})",
                attempts,
                path.display()
            )
        }
    }
}
