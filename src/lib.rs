// ABOUTME: Library module for mongo-postgres-migrator
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod migration;
pub mod mongodb;
pub mod postgres;
pub mod utils;
