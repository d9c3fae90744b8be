//! Storage interfaces for users, categories and expenses
//!
//! Handlers only talk to the traits in this module. Two backends implement
//! them: the PostgreSQL repositories and [`memory::MemoryStore`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Category, Expense, NewExpense, NewUser, User};

pub mod category;
pub mod expense;
pub mod memory;
pub mod user;

pub use category::CategoryRepository;
pub use expense::ExpenseRepository;
pub use memory::MemoryStore;
pub use user::UserRepository;

/// Errors raised by a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique field already holds the submitted value
    #[error("{field} is already taken")]
    Conflict { field: &'static str },

    /// The referenced owner does not exist
    #[error("User {0} does not exist")]
    UnknownOwner(Uuid),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Classify an error returned by an INSERT.
    ///
    /// Unique violations on the `users` constraints become [`StoreError::Conflict`],
    /// foreign key violations become [`StoreError::UnknownOwner`].
    pub(crate) fn from_insert(err: sqlx::Error, owner: Option<Uuid>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_username_key") => "username",
                    Some("users_email_key") => "email",
                    _ => "record",
                };
                return StoreError::Conflict { field };
            }
            if db_err.is_foreign_key_violation() {
                if let Some(owner) = owner {
                    return StoreError::UnknownOwner(owner);
                }
            }
        }
        StoreError::Query(err)
    }
}

/// Creates and looks up user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with [`StoreError::Conflict`] when the username
    /// or email is already registered.
    async fn create(&self, new_user: &NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Read-only access to persisted categories
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All persisted categories ordered by name
    async fn list(&self) -> StoreResult<Vec<Category>>;
}

/// Creates and reads expenses, always scoped to one owner
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn create(&self, owner: Uuid, new_expense: &NewExpense) -> StoreResult<Expense>;

    /// All expenses of `owner` ordered by date, then creation time
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Expense>>;
}
