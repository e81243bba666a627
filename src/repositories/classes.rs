use sqlx::PgPool;

use crate::db::models::Class;

pub(crate) const COLUMNS: &str = "\
    id, title, description, certification, max_students, student_count, \
    created_by, created_at, updated_at, deleted_at";

pub(crate) struct CreateClass<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) certification: Option<&'a str>,
    pub(crate) max_students: i32,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, class: CreateClass<'_>) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (
            id, title, description, certification, max_students, created_by,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(class.id)
    .bind(class.title)
    .bind(class.description)
    .bind(class.certification)
    .bind(class.max_students)
    .bind(class.created_by)
    .bind(class.created_at)
    .bind(class.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {COLUMNS} FROM classes WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {COLUMNS} FROM classes WHERE deleted_at IS NULL ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Atomically claims a seat; returns false when the class is full.
pub(crate) async fn claim_seat(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE classes SET student_count = student_count + 1 \
         WHERE id = $1 AND deleted_at IS NULL \
           AND (max_students = 0 OR student_count < max_students)",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn release_seat(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE classes SET student_count = GREATEST(student_count - 1, 0) WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
