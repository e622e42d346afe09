pub mod auth;
pub mod group;
pub mod health;
pub mod post;

use crate::error::AppError;

/// Fallback for every path no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
