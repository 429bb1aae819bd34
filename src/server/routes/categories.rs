use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_all_categories, questions::get_questions_for_category},
        Question,
    },
    server::{app::AppState, error::ApiError, extract::ApiPath},
};

use super::{category_map, ApiResponse};

#[derive(Serialize)]
struct CategoriesList {
    success: bool,
    categories: BTreeMap<i64, String>,
    total_categories: usize,
}

#[derive(Serialize)]
struct CategoryQuestions {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: i64,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<CategoriesList> {
    let categories = get_all_categories(&pool).await.map_err(ApiError::lookup)?;
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(CategoriesList {
        success: true,
        total_categories: categories.len(),
        categories: category_map(categories),
    }))
}

async fn category_questions(
    State(pool): State<SqlitePool>,
    ApiPath(category_id): ApiPath<i64>,
) -> ApiResponse<CategoryQuestions> {
    let questions = get_questions_for_category(&pool, &category_id.to_string())
        .await
        .map_err(ApiError::lookup)?;
    Ok(Json(CategoryQuestions {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: category_id,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_categories))
        .route("/categories", get(get_categories))
        .route("/categories/{category_id}/questions", get(category_questions))
        .with_state(state)
}
