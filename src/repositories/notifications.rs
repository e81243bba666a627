use sqlx::PgPool;

use crate::db::models::Notification;

pub(crate) const COLUMNS: &str = "id, user_id, kind, payload, created_at, read_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    kind: &str,
    payload: serde_json::Value,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, kind, payload, created_at) \
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(kind)
    .bind(payload)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether a notification of this kind already exists for the certificate
/// named in the payload.
pub(crate) async fn exists_for_certificate(
    pool: &PgPool,
    user_id: &str,
    kind: &str,
    certificate_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM notifications \
            WHERE user_id = $1 AND kind = $2 AND payload->>'certificate_id' = $3
        )",
    )
    .bind(user_id)
    .bind(kind)
    .bind(certificate_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn mark_read(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = COALESCE(read_at, $1) \
         WHERE id = $2 AND user_id = $3",
    )
    .bind(now)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
