use sqlx::PgPool;

use crate::db::models::Course;

pub(crate) const COLUMNS: &str = "\
    id, title, description, certification, is_published, student_count, \
    created_by, created_at, updated_at, deleted_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) certification: Option<&'a str>,
    pub(crate) is_published: bool,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) certification: Option<Option<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, course: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, title, description, certification, is_published, created_by,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(course.id)
    .bind(course.title)
    .bind(course.description)
    .bind(course.certification)
    .bind(course.is_published)
    .bind(course.created_by)
    .bind(course.created_at)
    .bind(course.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_published(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses \
         WHERE is_published = TRUE AND deleted_at IS NULL ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    update: UpdateCourse,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            certification = CASE WHEN $3 THEN $4 ELSE certification END,
            updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL",
    )
    .bind(update.title)
    .bind(update.description)
    .bind(update.certification.is_some())
    .bind(update.certification.flatten())
    .bind(update.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_published(
    pool: &PgPool,
    id: &str,
    is_published: bool,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses SET is_published = $1, updated_at = $2 \
         WHERE id = $3 AND deleted_at IS NULL",
    )
    .bind(is_published)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE courses SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn increment_student_count(
    pool: &PgPool,
    id: &str,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET student_count = GREATEST(student_count + $1, 0) WHERE id = $2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
