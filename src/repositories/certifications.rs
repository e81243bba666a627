use sqlx::PgPool;

use crate::db::models::Certification;
use crate::db::types::CertificationStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, course_id, class_id, title, verification_code, status, \
    artifact_url, issued_at";

pub(crate) struct CreateCertification<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) class_id: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) verification_code: &'a str,
    pub(crate) issued_at: time::PrimitiveDateTime,
}

/// Guarded insert against the per-(user, course) / per-(user, class) unique
/// indexes. A losing concurrent award returns false and is treated as
/// already-awarded by the caller.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    certification: CreateCertification<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO certifications (
            id, user_id, course_id, class_id, title, verification_code, status, issued_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        ON CONFLICT DO NOTHING",
    )
    .bind(certification.id)
    .bind(certification.user_id)
    .bind(certification.course_id)
    .bind(certification.class_id)
    .bind(certification.title)
    .bind(certification.verification_code)
    .bind(CertificationStatus::Issued)
    .bind(certification.issued_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications WHERE user_id = $1 AND course_id = $2"
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
) -> Result<Option<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications WHERE user_id = $1 AND class_id = $2"
    ))
    .bind(user_id)
    .bind(class_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_verification_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications WHERE verification_code = $1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn code_exists(pool: &PgPool, code: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM certifications WHERE verification_code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications WHERE user_id = $1 ORDER BY issued_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_artifact_url(
    pool: &PgPool,
    id: &str,
    artifact_url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE certifications SET artifact_url = $1 WHERE id = $2")
        .bind(artifact_url)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Issued certificates still waiting for a rendered artifact; input to the
/// repair sweep.
pub(crate) async fn list_missing_artifacts(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Certification>, sqlx::Error> {
    sqlx::query_as::<_, Certification>(&format!(
        "SELECT {COLUMNS} FROM certifications \
         WHERE artifact_url IS NULL AND status = $1 ORDER BY issued_at ASC LIMIT $2"
    ))
    .bind(CertificationStatus::Issued)
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}
