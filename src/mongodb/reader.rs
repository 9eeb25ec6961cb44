// ABOUTME: Collection enumeration for the source MongoDB database
// ABOUTME: Lists user collections in a stable order, excluding system ones

use anyhow::{Context, Result};
use mongodb::Client;

/// List all collection names in a MongoDB database
///
/// Retrieves names of all collections in the specified database, sorted for a
/// deterministic migration order. System collections (starting with
/// "system.") are excluded.
///
/// # Arguments
///
/// * `client` - MongoDB client connection
/// * `db_name` - Database name to list collections from
///
/// # Returns
///
/// Ordered vector of collection names
///
/// # Examples
///
/// ```no_run
/// # use mongo_postgres_migrator::mongodb::{connect_mongodb, reader::list_collections};
/// # async fn example() -> anyhow::Result<()> {
/// let client = connect_mongodb("mongodb://localhost:27017/mydb").await?;
/// let collections = list_collections(&client, "mydb").await?;
/// println!("Found {} collections", collections.len());
/// # Ok(())
/// # }
/// ```
pub async fn list_collections(client: &Client, db_name: &str) -> Result<Vec<String>> {
    tracing::info!("Listing collections in database '{}'", db_name);

    let database = client.database(db_name);

    let collection_names = database
        .list_collection_names(None)
        .await
        .with_context(|| format!("Failed to list collections in database '{}'", db_name))?;

    let mut user_collections: Vec<String> = collection_names
        .into_iter()
        .filter(|name| !name.starts_with("system."))
        .collect();
    user_collections.sort();

    tracing::debug!(
        "Found {} user collections in '{}'",
        user_collections.len(),
        db_name
    );

    Ok(user_collections)
}
