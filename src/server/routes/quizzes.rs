use axum::{extract::State, routing::post, Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions::get_quiz_candidates, Question},
    server::{app::AppState, error::ApiError, extract::ApiJson},
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

// id 0 stands for "all categories"
const ALL_CATEGORIES: i64 = 0;

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

#[derive(Deserialize)]
struct QuizRound {
    quiz_category: QuizCategory,
    previous_questions: Vec<i64>,
}

#[derive(Serialize)]
struct NextQuestion {
    success: bool,
    question: Option<Question>,
}

async fn play_quiz(
    State(pool): State<SqlitePool>,
    ApiJson(round): ApiJson<QuizRound>,
) -> ApiResponse<NextQuestion> {
    let category = match round.quiz_category.id {
        ALL_CATEGORIES => None,
        id => Some(id.to_string()),
    };
    let candidates =
        get_quiz_candidates(&pool, category.as_deref(), &round.previous_questions)
            .await
            .map_err(ApiError::lookup)?;
    let question = candidates.choose(&mut rand::thread_rng()).cloned();

    match &question {
        Some(q) => {
            QUIZ_QUESTIONS_SERVED
                .with_label_values(&[category.as_deref().unwrap_or("all")])
                .inc();
            tracing::debug!(id = q.id, candidates = candidates.len(), "Picked quiz question");
        }
        None => tracing::debug!(?category, "No questions left for quiz"),
    }

    Ok(Json(NextQuestion {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(play_quiz))
        .with_state(state)
}
