//! Common library for the expense tracker
//!
//! This crate provides the PostgreSQL plumbing shared by the services:
//! pool configuration, pool initialisation, schema migrations and error
//! handling.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     health_check(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
