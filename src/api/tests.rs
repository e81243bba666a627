use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_author, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::test::{
    AttemptResponse, QuestionPublicResponse, StartAttemptResponse, TestResponse,
};
use crate::services::attempts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:test_id", get(get_test))
        .route("/:test_id/publish", post(publish_test))
        .route("/:test_id/attempts", post(start_attempt))
}

async fn get_test(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<TestResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if !test.is_published {
        // Draft tests are only visible to whoever can manage the course.
        require_course_author(&state, &user, &test.course_id).await?;
    }

    let question_count = repositories::questions::count_by_test(state.db(), &test.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    Ok(Json(TestResponse::from_db(test, question_count)))
}

async fn publish_test(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<TestResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;
    require_course_author(&state, &user, &test.course_id).await?;

    let question_count = repositories::questions::count_by_test(state.db(), &test.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    if question_count == 0 {
        return Err(ApiError::BadRequest("Cannot publish a test without questions".to_string()));
    }

    repositories::tests::set_published(state.db(), &test_id, true, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish test"))?;

    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    Ok(Json(TestResponse::from_db(test, question_count)))
}

async fn start_attempt(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<(StatusCode, Json<StartAttemptResponse>), ApiError> {
    let (attempt, questions) = attempts::start_attempt(&state, &user.id, &test_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(StartAttemptResponse {
            attempt: AttemptResponse::from_db(attempt),
            questions: questions.into_iter().map(QuestionPublicResponse::from_db).collect(),
        }),
    ))
}
