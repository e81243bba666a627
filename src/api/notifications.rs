use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::notification::NotificationResponse;

const NOTIFICATION_PAGE_SIZE: i64 = 100;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_notifications))
        .route("/:notification_id/read", post(mark_read))
}

async fn list_my_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let rows =
        repositories::notifications::list_for_user(state.db(), &user.id, NOTIFICATION_PAGE_SIZE)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;
    Ok(Json(rows.into_iter().map(NotificationResponse::from_db).collect()))
}

async fn mark_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repositories::notifications::mark_read(
        state.db(),
        &notification_id,
        &user.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to mark notification read"))?;

    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}
