use sqlx::PgPool;

use crate::db::models::Test;

pub(crate) const COLUMNS: &str = "\
    id, course_id, lesson_id, title, passing_score, max_attempts, duration_minutes, \
    is_published, created_at, updated_at";

pub(crate) struct CreateTest<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) lesson_id: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) passing_score: i32,
    pub(crate) max_attempts: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    test: CreateTest<'_>,
) -> Result<Test, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!(
        "INSERT INTO tests (
            id, course_id, lesson_id, title, passing_score, max_attempts, duration_minutes,
            is_published, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(test.id)
    .bind(test.course_id)
    .bind(test.lesson_id)
    .bind(test.title)
    .bind(test.passing_score)
    .bind(test.max_attempts)
    .bind(test.duration_minutes)
    .bind(test.is_published)
    .bind(test.created_at)
    .bind(test.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!("SELECT {COLUMNS} FROM tests WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_lesson(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Option<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!("SELECT {COLUMNS} FROM tests WHERE lesson_id = $1"))
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!(
        "SELECT {COLUMNS} FROM tests WHERE course_id = $1 ORDER BY created_at ASC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_published_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tests WHERE course_id = $1 AND is_published = TRUE")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn set_published(
    pool: &PgPool,
    id: &str,
    is_published: bool,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tests SET is_published = $1, updated_at = $2 WHERE id = $3")
        .bind(is_published)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Published tests of a course the user has passed (any completed attempt at
/// or above the passing score).
pub(crate) async fn count_passed_for_user(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM tests t \
         WHERE t.course_id = $2 AND t.is_published = TRUE \
           AND EXISTS (
               SELECT 1 FROM test_attempts a \
               WHERE a.test_id = t.id AND a.user_id = $1 \
                 AND a.status = 'completed' AND a.score >= t.passing_score
           )",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}
