use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::LessonProgress;

pub(crate) const COLUMNS: &str = "\
    id, user_id, lesson_id, is_completed, progress_percentage, time_spent_minutes, \
    completed_at, created_at, updated_at";

pub(crate) async fn find_for_user_lesson(
    pool: &PgPool,
    user_id: &str,
    lesson_id: &str,
) -> Result<Option<LessonProgress>, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&format!(
        "SELECT {COLUMNS} FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2"
    ))
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

/// Progress rows for every lesson of a course, keyed by lesson id.
pub(crate) async fn map_for_user_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<HashMap<String, LessonProgress>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LessonProgress>(
        "SELECT p.* FROM lesson_progress p \
         JOIN lessons l ON l.id = p.lesson_id \
         WHERE p.user_id = $1 AND l.course_id = $2",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| (row.lesson_id.clone(), row)).collect())
}

/// Upsert that only touches time-tracking fields. Viewing content never sets
/// `is_completed`.
pub(crate) async fn record_activity(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    lesson_id: &str,
    progress_percentage: i32,
    time_spent_minutes: i32,
    now: time::PrimitiveDateTime,
) -> Result<LessonProgress, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress (
            id, user_id, lesson_id, is_completed, progress_percentage, time_spent_minutes,
            created_at, updated_at
        ) VALUES ($1,$2,$3,FALSE,$4,$5,$6,$6)
        ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            progress_percentage = GREATEST(lesson_progress.progress_percentage, EXCLUDED.progress_percentage),
            time_spent_minutes = lesson_progress.time_spent_minutes + EXCLUDED.time_spent_minutes,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(lesson_id)
    .bind(progress_percentage)
    .bind(time_spent_minutes)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Marks the lesson completed for the user, creating the row when missing.
/// `completed_at` is written once and preserved on replays.
pub(crate) async fn mark_completed(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    lesson_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<LessonProgress, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress (
            id, user_id, lesson_id, is_completed, progress_percentage, time_spent_minutes,
            completed_at, created_at, updated_at
        ) VALUES ($1,$2,$3,TRUE,100,0,$4,$4,$4)
        ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            is_completed = TRUE,
            progress_percentage = 100,
            completed_at = COALESCE(lesson_progress.completed_at, EXCLUDED.completed_at),
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(lesson_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_completed_for_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM lesson_progress p \
         JOIN lessons l ON l.id = p.lesson_id \
         WHERE p.user_id = $1 AND l.course_id = $2 \
           AND p.is_completed = TRUE AND l.is_published = TRUE",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}
