//! Expense repository for database operations

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{ExpenseStore, StoreError, StoreResult};
use crate::models::{Expense, NewExpense};

/// Expense repository
#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    /// Create a new expense repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseStore for ExpenseRepository {
    async fn create(&self, owner: Uuid, new_expense: &NewExpense) -> StoreResult<Expense> {
        info!(
            "Recording {} expense of {} for user {}",
            new_expense.category, new_expense.amount, owner
        );

        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, user_id, category, amount, date, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, category, amount, date, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&new_expense.category)
        .bind(new_expense.amount)
        .bind(new_expense.date)
        .bind(&new_expense.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_insert(e, Some(owner)))?;

        tx.commit().await?;

        Ok(expense)
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category, amount, date, description, created_at
            FROM expenses
            WHERE user_id = $1
            ORDER BY date, created_at
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    //! Run with `DATABASE_URL` pointing at a disposable database:
    //! `cargo test -p tracker -- --ignored`

    use super::*;
    use crate::models::NewUser;
    use crate::repositories::{UserRepository, UserStore};
    use chrono::NaiveDate;
    use common::database::{DatabaseConfig, init_pool, run_migrations};
    use rust_decimal::Decimal;

    async fn pool() -> PgPool {
        let config = DatabaseConfig::from_env().expect("database config");
        let pool = init_pool(&config).await.expect("database pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn groceries() -> NewExpense {
        NewExpense {
            category: "groceries".to_string(),
            amount: Decimal::new(1250, 2),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_failed_insert_leaves_no_row() {
        let pool = pool().await;
        let repository = ExpenseRepository::new(pool.clone());
        let ghost = Uuid::new_v4();

        let result = repository.create(ghost, &groceries()).await;
        assert!(matches!(result, Err(StoreError::UnknownOwner(id)) if id == ghost));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE user_id = $1")
            .bind(ghost)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_expenses_are_scoped_to_owner() {
        let pool = pool().await;
        let users = UserRepository::new(pool.clone());
        let expenses = ExpenseRepository::new(pool);

        let suffix = Uuid::new_v4().simple().to_string();
        let alice = users
            .create(&NewUser {
                username: format!("a{}", &suffix[..12]),
                email: format!("a{}@example.com", suffix),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let bob = users
            .create(&NewUser {
                username: format!("b{}", &suffix[..12]),
                email: format!("b{}@example.com", suffix),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let expense = expenses.create(alice.id, &groceries()).await.unwrap();
        assert_eq!(expense.amount, Decimal::new(1250, 2));

        let listed = expenses.list_by_owner(alice.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, expense.id);
        assert!(expenses.list_by_owner(bob.id).await.unwrap().is_empty());

        let duplicate = users
            .create(&NewUser {
                username: alice.username.clone(),
                email: format!("c{}@example.com", suffix),
                password_hash: "hash".to_string(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict { field: "username" })));
    }
}
