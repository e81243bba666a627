use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::test::{AnswerResponse, AnswerSubmit, AttemptResponse, SubmitResponse};
use crate::services::attempts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_attempts))
        .route("/:attempt_id", get(get_attempt))
        .route("/:attempt_id/answers", post(submit_answer))
        .route("/:attempt_id/submit", post(submit_attempt))
}

async fn list_my_attempts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let rows = repositories::attempts::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;
    Ok(Json(rows.into_iter().map(AttemptResponse::from_db).collect()))
}

async fn get_attempt(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (attempt, answers) = attempts::get_attempt(&state, &user.id, &attempt_id).await?;

    let answers: Vec<AnswerResponse> =
        answers.into_iter().map(AnswerResponse::from_db).collect();
    let attempt = AttemptResponse::from_db(attempt);

    Ok(Json(serde_json::json!({ "attempt": attempt, "answers": answers })))
}

async fn submit_answer(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Json(payload): Json<AnswerSubmit>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let answer = attempts::answer_question(
        &state,
        &user.id,
        &attempt_id,
        &payload.question_id,
        payload.selected_option,
        payload.answer_text.as_deref(),
    )
    .await?;

    Ok(Json(AnswerResponse::from_db(answer)))
}

async fn submit_attempt(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let outcome = attempts::submit_attempt(&state, &user.id, &attempt_id).await?;

    Ok(Json(SubmitResponse {
        attempt_id: outcome.attempt.id,
        score: outcome.score,
        correct_answers: outcome.correct_answers,
        total_questions: outcome.attempt.total_questions,
        time_taken_minutes: outcome.time_taken_minutes,
        passed: outcome.passed,
    }))
}
