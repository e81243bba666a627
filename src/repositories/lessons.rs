use sqlx::PgPool;

use crate::db::models::Lesson;

pub(crate) const COLUMNS: &str = "\
    id, course_id, title, content, order_index, is_published, created_at, updated_at";

pub(crate) struct CreateLesson<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) order_index: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, lesson: CreateLesson<'_>) -> Result<Lesson, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "INSERT INTO lessons (
            id, course_id, title, content, order_index, is_published, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(lesson.id)
    .bind(lesson.course_id)
    .bind(lesson.title)
    .bind(lesson.content)
    .bind(lesson.order_index)
    .bind(lesson.is_published)
    .bind(lesson.created_at)
    .bind(lesson.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {COLUMNS} FROM lessons WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Lessons of a course in `order_index` order. Unlock evaluation depends on
/// this ordering.
pub(crate) async fn list_by_course_ordered(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY order_index ASC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_course_and_order(
    pool: &PgPool,
    course_id: &str,
    order_index: i32,
) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {COLUMNS} FROM lessons WHERE course_id = $1 AND order_index = $2"
    ))
    .bind(course_id)
    .bind(order_index)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_published_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE course_id = $1 AND is_published = TRUE")
        .bind(course_id)
        .fetch_one(pool)
        .await
}
