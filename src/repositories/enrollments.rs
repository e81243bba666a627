use sqlx::PgPool;

use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, course_id, class_id, status, progress, enrolled_at, completed_at, updated_at";

/// Guarded insert against the unique (user_id, course_id) /
/// (user_id, class_id) indexes. Returns false when already enrolled.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    user_id: &str,
    course_id: Option<&str>,
    class_id: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO enrollments (
            id, user_id, course_id, class_id, status, progress, enrolled_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,0,$6,$6)
        ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(user_id)
    .bind(course_id)
    .bind(class_id)
    .bind(EnrollmentStatus::Enrolled)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_for_user_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user_class(
    pool: &PgPool,
    user_id: &str,
    class_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND class_id = $2"
    ))
    .bind(user_id)
    .bind(class_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Persists a recomputed progress value. Completion is one-way: once a row is
/// completed its status and `completed_at` are left untouched.
pub(crate) async fn update_progress(
    pool: &PgPool,
    id: &str,
    progress: i32,
    status: EnrollmentStatus,
    completed_at: Option<time::PrimitiveDateTime>,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE enrollments SET
            progress = $1,
            status = CASE WHEN status = 'completed' THEN status ELSE $2 END,
            completed_at = COALESCE(completed_at, $3),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(progress)
    .bind(status)
    .bind(completed_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    status: EnrollmentStatus,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE enrollments SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
