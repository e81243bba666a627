use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::schemas::enrollment::EnrollmentResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_enrollments))
        .route("/:enrollment_id", delete(drop_enrollment))
}

async fn list_my_enrollments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let rows = repositories::enrollments::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;
    Ok(Json(rows.into_iter().map(EnrollmentResponse::from_db).collect()))
}

async fn drop_enrollment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let enrollment = repositories::enrollments::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))?
        .into_iter()
        .find(|e| e.id == enrollment_id)
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    if enrollment.status == EnrollmentStatus::Completed {
        return Err(ApiError::Conflict("Completed enrollments cannot be dropped".to_string()));
    }
    if enrollment.status == EnrollmentStatus::Dropped {
        return Err(ApiError::Conflict("Enrollment is already dropped".to_string()));
    }

    repositories::enrollments::set_status(
        state.db(),
        &enrollment.id,
        EnrollmentStatus::Dropped,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to drop enrollment"))?;

    if let Some(course_id) = &enrollment.course_id {
        repositories::courses::increment_student_count(state.db(), course_id, -1)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update student count"))?;
    }
    if let Some(class_id) = &enrollment.class_id {
        repositories::classes::release_seat(state.db(), class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to release class seat"))?;
    }

    Ok(StatusCode::NO_CONTENT)
}
