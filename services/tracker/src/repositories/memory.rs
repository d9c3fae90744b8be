//! In-process store used for local runs and tests
//!
//! Every write checks its constraints before touching the data, so a rejected
//! write leaves the store unchanged, matching the transactional PostgreSQL
//! repositories.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{CategoryStore, ExpenseStore, StoreError, StoreResult, UserStore};
use crate::models::{Category, Expense, NewExpense, NewUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

/// Users, categories and expenses held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a persisted category
    #[cfg(test)]
    pub async fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tables.write().await.categories.push(category.clone());
        category
    }

    /// Number of stored users
    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of stored expenses across all owners
    #[cfg(test)]
    pub async fn expense_count(&self) -> usize {
        self.tables.read().await.expenses.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> StoreResult<User> {
        info!("Creating new user: {}", new_user.username);

        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Conflict { field: "username" });
        }
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict { field: "email" });
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.tables.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn create(&self, owner: Uuid, new_expense: &NewExpense) -> StoreResult<Expense> {
        info!(
            "Recording {} expense of {} for user {}",
            new_expense.category, new_expense.amount, owner
        );

        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == owner) {
            return Err(StoreError::UnknownOwner(owner));
        }

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: owner,
            category: new_expense.category.clone(),
            amount: new_expense.amount,
            date: new_expense.date,
            description: new_expense.description.clone(),
            created_at: Utc::now(),
        };
        tables.expenses.push(expense.clone());

        Ok(expense)
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Expense>> {
        let tables = self.tables.read().await;
        let mut expenses: Vec<Expense> = tables
            .expenses
            .iter()
            .filter(|e| e.user_id == owner)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal dates
        expenses.sort_by_key(|e| e.date);
        Ok(expenses)
    }
}
