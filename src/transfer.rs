//! CSV import and export of the question bank.
//!
//! This is how categories get into a fresh database: the API never creates
//! them.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::queries::categories::{get_all_categories, import_categories};
use crate::db::queries::questions::{get_all_questions, import_questions};
use crate::db::{Category, Question};

pub const CATEGORIES_FILE: &str = "categories.csv";
pub const QUESTIONS_FILE: &str = "questions.csv";

fn write_to(path: &Path, data: Vec<impl Serialize>) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    for line in data {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_from<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        let record: T = record.with_context(|| format!("Malformed record in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

pub async fn export_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories = get_all_categories(pool).await?;
    let questions = get_all_questions(pool).await?;
    if !dir.exists() {
        std::fs::create_dir_all(dir)?
    }
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Exporting to {}",
        dir.display()
    );
    write_to(&dir.join(CATEGORIES_FILE), categories)?;
    write_to(&dir.join(QUESTIONS_FILE), questions)?;
    Ok(())
}

/// Loads both files, then inserts everything in one transaction: a malformed
/// file or a rejected row imports nothing.
pub async fn import_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories: Vec<Category> = read_from(&dir.join(CATEGORIES_FILE))?;
    let questions: Vec<Question> = read_from(&dir.join(QUESTIONS_FILE))?;
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Importing from {}",
        dir.display()
    );
    let mut tx = pool.begin().await?;
    import_categories(&mut tx, categories)
        .await
        .context("Cannot import categories")?;
    import_questions(&mut tx, questions)
        .await
        .context("Cannot import questions")?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;

    #[tokio::test]
    async fn export_then_import_reproduces_data() {
        let source = in_memory().await.unwrap();
        let categories = vec![
            Category { id: 1, kind: "Science".into() },
            Category { id: 2, kind: "Art, Modern".into() },
        ];
        let questions = vec![
            Question {
                id: 3,
                question: "Who said \"Eureka\"?".into(),
                answer: "Archimedes".into(),
                category: "1".into(),
                difficulty: 3,
            },
            Question {
                id: 7,
                question: "Who painted Guernica?".into(),
                answer: "Picasso".into(),
                category: "2".into(),
                difficulty: 2,
            },
        ];
        let mut tx = source.begin().await.unwrap();
        import_categories(&mut tx, categories.clone()).await.unwrap();
        import_questions(&mut tx, questions.clone()).await.unwrap();
        tx.commit().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("dump");
        export_data(&source, &export_dir).await.unwrap();
        assert!(export_dir.join(CATEGORIES_FILE).exists());

        let target = in_memory().await.unwrap();
        import_data(&target, &export_dir).await.unwrap();
        assert_eq!(get_all_categories(&target).await.unwrap(), categories);
        assert_eq!(get_all_questions(&target).await.unwrap(), questions);
    }

    #[tokio::test]
    async fn missing_files_import_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATEGORIES_FILE), "id,type\n1,Science\n").unwrap();

        let pool = in_memory().await.unwrap();
        assert!(import_data(&pool, dir.path()).await.is_err());
        assert!(get_all_categories(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_question_rolls_back_categories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATEGORIES_FILE), "id,type\n1,Science\n").unwrap();
        std::fs::write(
            dir.path().join(QUESTIONS_FILE),
            "id,question,answer,category,difficulty\n1,Q?,A,1,9\n",
        )
        .unwrap();

        let pool = in_memory().await.unwrap();
        assert!(import_data(&pool, dir.path()).await.is_err());
        assert!(get_all_categories(&pool).await.unwrap().is_empty());
        assert!(get_all_questions(&pool).await.unwrap().is_empty());
    }
}
