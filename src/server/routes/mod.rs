mod categories;
mod questions;
mod quizzes;

use std::collections::BTreeMap;

use axum::Json;

use crate::db::Category;

use super::error::ApiError;

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

pub type ApiResponse<T> = Result<Json<T>, ApiError>;

/// Categories keyed by id, the way clients look up a question's category.
fn category_map(categories: Vec<Category>) -> BTreeMap<i64, String> {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}
