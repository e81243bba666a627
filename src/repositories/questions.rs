use sqlx::PgPool;

use crate::db::models::Question;
use crate::db::types::QuestionType;

pub(crate) const COLUMNS: &str = "\
    id, test_id, order_index, question_type, prompt, options, correct_option, \
    correct_text, points, solution, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: &'a str,
    pub(crate) options: Vec<String>,
    pub(crate) correct_option: Option<i32>,
    pub(crate) correct_text: Option<&'a str>,
    pub(crate) points: i32,
    pub(crate) solution: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    question: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, test_id, order_index, question_type, prompt, options, correct_option,
            correct_text, points, solution, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.test_id)
    .bind(question.order_index)
    .bind(question.question_type)
    .bind(question.prompt)
    .bind(sqlx::types::Json(question.options))
    .bind(question.correct_option)
    .bind(question.correct_text)
    .bind(question.points)
    .bind(question.solution)
    .bind(question.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 ORDER BY order_index ASC"
    ))
    .bind(test_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn total_points_by_test(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(points), 0) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(executor)
        .await
}
