//! Common library for the inventory workspace
//!
//! This crate provides shared infrastructure used by the services of the
//! workspace: PostgreSQL configuration, pool initialisation, migrations and
//! the associated error types.

pub mod database;
pub mod error;

pub use database::{DatabaseConfig, health_check, init_pool, run_migrations};
pub use error::{DatabaseError, DatabaseResult};
