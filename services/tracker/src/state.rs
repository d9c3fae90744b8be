//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    chart::ChartRenderer,
    repositories::{
        CategoryRepository, CategoryStore, ExpenseRepository, ExpenseStore, MemoryStore,
        UserRepository, UserStore,
    },
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub sessions: SessionManager,
    pub charts: ChartRenderer,
}

impl AppState {
    /// State backed by the PostgreSQL repositories
    pub fn with_postgres(pool: PgPool, sessions: SessionManager, charts: ChartRenderer) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            categories: Arc::new(CategoryRepository::new(pool.clone())),
            expenses: Arc::new(ExpenseRepository::new(pool)),
            sessions,
            charts,
        }
    }

    /// State backed by a single in-memory store
    pub fn with_memory(
        store: Arc<MemoryStore>,
        sessions: SessionManager,
        charts: ChartRenderer,
    ) -> Self {
        Self {
            users: store.clone(),
            categories: store.clone(),
            expenses: store,
            sessions,
            charts,
        }
    }
}
