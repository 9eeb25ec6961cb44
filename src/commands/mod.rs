// ABOUTME: Command implementations for each workflow phase
// ABOUTME: Exports migrate, package, and run commands

pub mod migrate;
pub mod package;
pub mod run;

pub use migrate::migrate;
pub use package::package;
pub use run::run;
