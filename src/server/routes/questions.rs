use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_all_categories, questions},
        NewQuestion, Question, StoreResult,
    },
    server::{
        app::AppState,
        deserializers::deserialize_lenient_i64,
        error::ApiError,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    telemetry::{QUESTIONS_CREATED, QUESTIONS_DELETED},
};

use super::{category_map, ApiResponse};

pub const QUESTIONS_PER_PAGE: i64 = 10;

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    page: Option<i64>,
}

impl Pagination {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(QUESTIONS_PER_PAGE)
    }

    /// Offset of the first question on the page, `None` when the page
    /// cannot hold any question.
    fn offset(&self) -> Option<i64> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit();
        if page < 1 || limit < 1 {
            return None;
        }
        (page - 1).checked_mul(limit)
    }

    async fn fetch(&self, pool: &SqlitePool) -> StoreResult<Vec<Question>> {
        match self.offset() {
            Some(offset) => questions::get_questions_page(pool, self.limit(), offset).await,
            None => Ok(vec![]),
        }
    }
}

#[derive(Deserialize)]
struct QuestionBody {
    question: String,
    answer: String,
    difficulty: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    category: i64,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: i64,
    categories: BTreeMap<i64, String>,
    current_category: Option<i64>,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    deleted: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Option<i64>,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResponse<QuestionsPage> {
    let questions = pagination.fetch(&pool).await.map_err(ApiError::lookup)?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    let total_questions = questions::count_questions(&pool)
        .await
        .map_err(ApiError::lookup)?;
    let categories = get_all_categories(&pool).await.map_err(ApiError::lookup)?;
    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions,
        categories: category_map(categories),
        current_category: None,
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResponse<Deleted> {
    let id: i64 = id.parse().map_err(|_| {
        tracing::info!("Cannot delete question with non-numeric id {id:?}");
        ApiError::Unprocessable
    })?;
    questions::delete_question(&pool, id)
        .await
        .map_err(ApiError::mutation)?;
    QUESTIONS_DELETED.inc();
    tracing::info!(id, "Deleted question");

    let questions = pagination.fetch(&pool).await.map_err(ApiError::mutation)?;
    let total_questions = questions::count_questions(&pool)
        .await
        .map_err(ApiError::mutation)?;
    Ok(Json(Deleted {
        success: true,
        deleted: id,
        questions,
        total_questions,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiQuery(pagination): ApiQuery<Pagination>,
    ApiJson(body): ApiJson<QuestionBody>,
) -> ApiResponse<Created> {
    let new_question = NewQuestion {
        question: body.question,
        answer: body.answer,
        category: body.category.to_string(),
        difficulty: body.difficulty,
    };
    let id = questions::create_question(&pool, &new_question)
        .await
        .map_err(ApiError::mutation)?;
    QUESTIONS_CREATED.inc();
    tracing::info!(id, category = %new_question.category, "Created question");

    let questions = pagination.fetch(&pool).await.map_err(ApiError::mutation)?;
    let total_questions = questions::count_questions(&pool)
        .await
        .map_err(ApiError::mutation)?;
    Ok(Json(Created {
        success: true,
        created: id,
        questions,
        total_questions,
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<SearchResults> {
    let term = match body.search_term {
        Some(term) if !term.is_empty() => term,
        _ => return Err(ApiError::NotFound),
    };
    let questions = questions::search_questions(&pool, &term)
        .await
        .map_err(ApiError::lookup)?;
    Ok(Json(SearchResults {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: None,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}
