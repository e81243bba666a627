use crate::db::models::TestAttemptAnswer;

pub(crate) const COLUMNS: &str = "\
    id, attempt_id, question_id, selected_option, answer_text, is_correct, \
    points_earned, created_at";

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option: Option<i32>,
    pub(crate) answer_text: Option<&'a str>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Write-once insert guarded by the unique (attempt_id, question_id) pair.
/// Returns false when an answer already exists; the stored answer is never
/// overwritten.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    answer: CreateAnswer<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO test_attempt_answers (
            id, attempt_id, question_id, selected_option, answer_text, is_correct,
            points_earned, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        ON CONFLICT (attempt_id, question_id) DO NOTHING",
    )
    .bind(answer.id)
    .bind(answer.attempt_id)
    .bind(answer.question_id)
    .bind(answer.selected_option)
    .bind(answer.answer_text)
    .bind(answer.is_correct)
    .bind(answer.points_earned)
    .bind(answer.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<Vec<TestAttemptAnswer>, sqlx::Error> {
    sqlx::query_as::<_, TestAttemptAnswer>(&format!(
        "SELECT {COLUMNS} FROM test_attempt_answers WHERE attempt_id = $1 ORDER BY created_at ASC"
    ))
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn sum_points_earned(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(points_earned), 0) FROM test_attempt_answers WHERE attempt_id = $1",
    )
    .bind(attempt_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_correct(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM test_attempt_answers WHERE attempt_id = $1 AND is_correct = TRUE",
    )
    .bind(attempt_id)
    .fetch_one(executor)
    .await
}
