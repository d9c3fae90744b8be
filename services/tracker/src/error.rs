//! Custom error types for the tracker service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{chart::ChartError, repositories::StoreError, views};

/// Custom error type for request handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// No route or resource matched
    #[error("Page not found")]
    NotFound,

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Password hashing failed
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    /// Session or flash token could not be signed
    #[error("Session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    /// Summary chart could not be rendered
    #[error("Chart rendering error: {0}")]
    Chart(#[from] ChartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, views::not_found_page()).into_response(),
            other => {
                // Store writes are transaction-scoped, so nothing partial is left behind
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    views::internal_error_page(),
                )
                    .into_response()
            }
        }
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;
