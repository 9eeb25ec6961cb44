// ABOUTME: PostgreSQL target access: connection lifecycle and statement execution
// ABOUTME: Exports the connection helpers and the SqlExecutor seam

pub mod connection;
pub mod executor;

pub use connection::{connect, connect_with_retry};
pub use executor::{PgExecutor, SqlExecutor, SqlValue};
