//! Integration tests for the database plumbing
//!
//! These tests need a reachable PostgreSQL instance named by `DATABASE_URL`
//! and are ignored by default: `cargo test -p common -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

/// Connects, applies the schema and checks that the tables are queryable
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    health_check(&pool).await?;

    run_migrations(&pool).await?;
    // Applying twice is a no-op
    run_migrations(&pool).await?;

    for table in ["users", "categories", "expenses"] {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM information_schema.tables WHERE table_name = $1",
        )
        .bind(table)
        .fetch_one(&pool)
        .await?;

        let count: i64 = row.get("n");
        assert_eq!(count, 1, "table {} missing after migration", table);
    }

    Ok(())
}
