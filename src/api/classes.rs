use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::db::types::EnrollmentStatus;
use crate::schemas::class::{ClassCreate, ClassResponse};
use crate::schemas::enrollment::EnrollmentResponse;
use crate::services::certificates;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/:class_id", get(get_class))
        .route("/:class_id/enroll", post(enroll))
        .route("/:class_id/members/:user_id/complete", post(complete_member))
}

async fn create_class(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    validate_payload(&payload)?;

    let now = primitive_now_utc();
    let class = repositories::classes::create(
        state.db(),
        repositories::classes::CreateClass {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            certification: payload.certification.as_deref(),
            max_students: payload.max_students,
            created_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    Ok((StatusCode::CREATED, Json(ClassResponse::from_db(class))))
}

async fn list_classes(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = repositories::classes::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;
    Ok(Json(classes.into_iter().map(ClassResponse::from_db).collect()))
}

async fn get_class(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<ClassResponse>, ApiError> {
    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    Ok(Json(ClassResponse::from_db(class)))
}

async fn enroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    // The seat is claimed first; a lost enrollment race releases it again.
    let seat = repositories::classes::claim_seat(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to claim class seat"))?;
    if !seat {
        return Err(ApiError::Conflict("Class is full".to_string()));
    }

    let created = repositories::enrollments::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        None,
        Some(&class_id),
        primitive_now_utc(),
    )
    .await;

    let created = match created {
        Ok(created) => created,
        Err(err) => {
            release_seat_best_effort(&state, &class_id).await;
            return Err(ApiError::internal(err, "Failed to create enrollment"));
        }
    };
    if !created {
        release_seat_best_effort(&state, &class_id).await;
        return Err(ApiError::Conflict("Already enrolled in this class".to_string()));
    }

    let enrollment = repositories::enrollments::find_for_user_class(state.db(), &user.id, &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
        .ok_or_else(|| ApiError::internal("missing row", "Failed to load enrollment"))?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

/// Class completion is attested by an admin, not computed: marking the
/// enrollment completed at 100% is what makes the member certificate-eligible.
async fn complete_member(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path((class_id, user_id)): Path<(String, String)>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = repositories::enrollments::find_for_user_class(state.db(), &user_id, &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    let now = primitive_now_utc();
    repositories::enrollments::update_progress(
        state.db(),
        &enrollment.id,
        100,
        EnrollmentStatus::Completed,
        Some(now),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete enrollment"))?;

    if let Err(err) = certificates::check_and_award_for_class(&state, &user_id, &class_id).await {
        tracing::error!(
            user_id,
            class_id,
            error = %format!("{err:#}"),
            "certificate award failed after class completion"
        );
    }

    let enrollment = repositories::enrollments::find_for_user_class(state.db(), &user_id, &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(EnrollmentResponse::from_db(enrollment)))
}

async fn release_seat_best_effort(state: &AppState, class_id: &str) {
    if let Err(err) = repositories::classes::release_seat(state.db(), class_id).await {
        tracing::error!(class_id, error = %err, "failed to release class seat");
    }
}
