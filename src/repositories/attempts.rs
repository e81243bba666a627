use sqlx::PgPool;

use crate::db::models::TestAttempt;
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, test_id, user_id, attempt_number, status, score, total_questions, \
    started_at, completed_at, time_taken_minutes, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) total_questions: i32,
    pub(crate) started_at: time::PrimitiveDateTime,
}

/// Takes a per-(test, user) advisory lock for the current transaction so the
/// count-then-insert in attempt start is serialized.
pub(crate) async fn acquire_test_user_lock(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
        .bind(test_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Guarded insert: loses against the partial unique index on
/// (test_id, user_id) WHERE status = 'in_progress'. Returns false when an
/// in-progress attempt already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: CreateAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO test_attempts (
            id, test_id, user_id, attempt_number, status, total_questions,
            started_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        ON CONFLICT DO NOTHING",
    )
    .bind(attempt.id)
    .bind(attempt.test_id)
    .bind(attempt.user_id)
    .bind(attempt.attempt_number)
    .bind(AttemptStatus::InProgress)
    .bind(attempt.total_questions)
    .bind(attempt.started_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<TestAttempt>, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!("SELECT {COLUMNS} FROM test_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<TestAttempt, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!("SELECT {COLUMNS} FROM test_attempts WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    user_id: &str,
) -> Result<Option<TestAttempt>, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {COLUMNS} FROM test_attempts \
         WHERE test_id = $1 AND user_id = $2 AND status = $3"
    ))
    .bind(test_id)
    .bind(user_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_by_test_and_user(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM test_attempts WHERE test_id = $1 AND user_id = $2")
        .bind(test_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<TestAttempt>, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {COLUMNS} FROM test_attempts WHERE user_id = $1 ORDER BY started_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Marks the attempt completed with its final score. Touches only
/// in-progress rows so a double submit cannot overwrite a finished attempt.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: i32,
    time_taken_minutes: i32,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_attempts \
         SET status = $1, score = $2, time_taken_minutes = $3, completed_at = $4, updated_at = $4 \
         WHERE id = $5 AND status = $6",
    )
    .bind(AttemptStatus::Completed)
    .bind(score)
    .bind(time_taken_minutes)
    .bind(now)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn touch(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE test_attempts SET updated_at = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// In-progress attempts whose last activity predates the per-test abandon
/// deadline (`duration_minutes` plus the grace period).
pub(crate) async fn abandon_stale(
    pool: &PgPool,
    grace_minutes: i64,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_attempts a \
         SET status = $1, updated_at = $2 \
         FROM tests t \
         WHERE t.id = a.test_id AND a.status = $3 \
           AND a.updated_at < $2 - make_interval(mins => t.duration_minutes + $4)",
    )
    .bind(AttemptStatus::Abandoned)
    .bind(now)
    .bind(AttemptStatus::InProgress)
    .bind(grace_minutes as i32)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
