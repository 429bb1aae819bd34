use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::db::{StoreError, StoreResult};

const QUESTION_COLUMNS: &str = "id, question, answer, category, difficulty";

/// A stored question, serialized in the shape clients receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub difficulty: i64,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub difficulty: i64,
}

pub async fn get_all_questions(pool: &SqlitePool) -> StoreResult<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn get_questions_page(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id LIMIT ?1 OFFSET ?2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn count_questions(pool: &SqlitePool) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> StoreResult<Question> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(question)
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> StoreResult<i64> {
    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(&question.category)
    .bind(question.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Case-insensitive substring match on the question text.
///
/// SQLite's `lower` only folds ASCII, so matching happens here with Unicode
/// case folding. The term is taken literally.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> StoreResult<Vec<Question>> {
    let term = term.to_lowercase();
    let questions = get_all_questions(pool)
        .await?
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&term))
        .collect();
    Ok(questions)
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: &str,
) -> StoreResult<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE category = ?1 ORDER BY id"
    ))
    .bind(category)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

/// Questions that may be asked next: the whole set or one category, minus
/// the ones already asked.
pub async fn get_quiz_candidates(
    pool: &SqlitePool,
    category: Option<&str>,
    excluded: &[i64],
) -> StoreResult<Vec<Question>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE 1 = 1"));
    if let Some(category) = category {
        builder.push(" AND category = ").push_bind(category);
    }
    if !excluded.is_empty() {
        builder.push(" AND id NOT IN (");
        let mut ids = builder.separated(", ");
        for id in excluded {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    builder.push(" ORDER BY id");

    let questions = builder
        .build_query_as::<Question>()
        .fetch_all(pool)
        .await?;
    Ok(questions)
}

pub async fn import_questions(
    conn: &mut SqliteConnection,
    questions: Vec<Question>,
) -> StoreResult<()> {
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(question.id)
        .bind(question.question)
        .bind(question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;

    fn new_question(question: &str, category: &str, difficulty: i64) -> NewQuestion {
        NewQuestion {
            question: question.to_owned(),
            answer: "answer".to_owned(),
            category: category.to_owned(),
            difficulty,
        }
    }

    async fn seeded() -> SqlitePool {
        let pool = in_memory().await.unwrap();
        for (text, category) in [
            ("What is the boiling point of water?", "1"),
            ("Who painted the Mona Lisa?", "2"),
            ("What is 50% of 10?", "1"),
            ("Which planet is known as the red planet?", "1"),
            ("Who sculpted David?", "2"),
        ] {
            create_question(&pool, &new_question(text, category, 2))
                .await
                .unwrap();
        }
        pool
    }

    fn ids(questions: &[Question]) -> Vec<i64> {
        questions.iter().map(|q| q.id).collect()
    }

    #[tokio::test]
    async fn pages_are_sliced_in_id_order() {
        let pool = seeded().await;
        assert_eq!(ids(&get_questions_page(&pool, 2, 0).await.unwrap()), vec![1, 2]);
        assert_eq!(ids(&get_questions_page(&pool, 2, 4).await.unwrap()), vec![5]);
        assert!(get_questions_page(&pool, 2, 10).await.unwrap().is_empty());
        assert_eq!(count_questions(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let pool = seeded().await;
        delete_question(&pool, 3).await.unwrap();
        assert!(matches!(
            get_question_by_id(&pool, 3).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            delete_question(&pool, 3).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(count_questions(&pool).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let pool = seeded().await;
        delete_question(&pool, 5).await.unwrap();
        let id = create_question(&pool, &new_question("New?", "1", 1))
            .await
            .unwrap();
        assert_eq!(id, 6);
    }

    #[tokio::test]
    async fn difficulty_out_of_range_is_a_constraint_error() {
        let pool = seeded().await;
        let res = create_question(&pool, &new_question("Too hard?", "1", 22)).await;
        assert!(matches!(res, Err(StoreError::Constraint(_))));
        assert_eq!(count_questions(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_literal() {
        let pool = seeded().await;
        assert_eq!(ids(&search_questions(&pool, "WHO").await.unwrap()), vec![2, 5]);
        assert_eq!(ids(&search_questions(&pool, "50%").await.unwrap()), vec![3]);
        assert!(search_questions(&pool, "%").await.unwrap().len() == 1);
        assert!(search_questions(&pool, "nothing like this")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = seeded().await;
        let id = create_question(&pool, &new_question("Who wrote ÉMILE?", "2", 3))
            .await
            .unwrap();
        assert_eq!(ids(&search_questions(&pool, "émile").await.unwrap()), vec![id]);
        assert_eq!(ids(&search_questions(&pool, "Émile").await.unwrap()), vec![id]);
    }

    #[tokio::test]
    async fn questions_filtered_by_category() {
        let pool = seeded().await;
        let art = get_questions_for_category(&pool, "2").await.unwrap();
        assert_eq!(ids(&art), vec![2, 5]);
        assert!(art.iter().all(|q| q.category == "2"));
        assert!(get_questions_for_category(&pool, "99")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_skip_previous_questions() {
        let pool = seeded().await;
        assert_eq!(
            ids(&get_quiz_candidates(&pool, None, &[]).await.unwrap()),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(
            ids(&get_quiz_candidates(&pool, None, &[1, 4]).await.unwrap()),
            vec![2, 3, 5]
        );
        assert_eq!(
            ids(&get_quiz_candidates(&pool, Some("1"), &[3]).await.unwrap()),
            vec![1, 4]
        );
        assert!(get_quiz_candidates(&pool, Some("2"), &[2, 5])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn import_keeps_ids() {
        let pool = in_memory().await.unwrap();
        let question = Question {
            id: 42,
            question: "Imported?".into(),
            answer: "Yes".into(),
            category: "3".into(),
            difficulty: 4,
        };
        let mut conn = pool.acquire().await.unwrap();
        import_questions(&mut conn, vec![question.clone()])
            .await
            .unwrap();
        drop(conn);
        assert_eq!(get_question_by_id(&pool, 42).await.unwrap(), question);
        assert_eq!(get_all_questions(&pool).await.unwrap(), vec![question]);
    }
}
